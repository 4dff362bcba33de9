pub mod access_token;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod normalize;
pub mod proof;
pub mod service;

pub mod proto {
    tonic::include_proto!("dpop.validator.v1");
}
