// Infrastructure layer - external dependencies and adapters
pub mod http_gateway;
pub mod settings;
