//! Wire types for the `sensors.SensorService` gRPC service.
//!
//! These are the source of truth for the message encoding;
//! `proto/sensors.proto` is a reference copy kept in step by hand. The
//! server and client stubs are generated by `build.rs` and included below.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Annotation {
    #[prost(string, tag = "1")]
    pub key: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub value: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Sensor {
    #[prost(string, tag = "1")]
    pub uuid: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub collection: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub unit: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub ingress: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "6")]
    pub annotations: ::prost::alloc::vec::Vec<Annotation>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SensorUpdate {
    #[prost(message, optional, tag = "1")]
    pub selector: ::core::option::Option<Sensor>,
    #[prost(message, optional, tag = "2")]
    pub update: ::core::option::Option<Sensor>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Sensors {
    #[prost(int32, tag = "1")]
    pub count: i32,
    #[prost(message, repeated, tag = "2")]
    pub sensors: ::prost::alloc::vec::Vec<Sensor>,
}

include!(concat!(env!("OUT_DIR"), "/sensors.SensorService.rs"));
