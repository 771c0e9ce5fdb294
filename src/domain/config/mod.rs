pub mod gateway;
pub mod upstream;

pub use gateway::GatewayConfig;
pub use upstream::UpstreamConfig;
