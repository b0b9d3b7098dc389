pub mod alerts;
pub mod charts;
pub mod fetch;
pub mod model;
pub mod scheduler;
pub mod status;
pub mod surface;
pub mod web;
