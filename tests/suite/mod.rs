mod config;
mod gateway;
mod telemetry;
