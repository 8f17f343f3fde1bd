pub mod handlers;
pub mod router;

pub use router::relay_routes;
