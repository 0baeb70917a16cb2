pub mod controller;
pub mod model;
pub mod policy;
pub mod router;
pub mod service;
