pub mod naming;
pub mod params;
pub mod pipeline;
