//! Build script for the gRPC service stubs
//!
//! Message types live in `src/proto.rs` as hand-written prost structs, so
//! only the service plumbing is generated here and no `protoc` is needed at
//! build time. `proto/sensors.proto` is a reference copy of the wire contract
//! for clients and is not read by this script; keep it in step with
//! `src/proto.rs` and the method table below by hand.

use tonic_build::manual::{Builder, Method, Service};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let service = Service::builder()
        .name("SensorService")
        .package("sensors")
        .method(
            Method::builder()
                .name("create_sensor")
                .route_name("CreateSensor")
                .input_type("crate::proto::Sensor")
                .output_type("crate::proto::Sensor")
                .codec_path("tonic::codec::ProstCodec")
                .build(),
        )
        .method(
            Method::builder()
                .name("read_sensors")
                .route_name("ReadSensors")
                .input_type("crate::proto::Sensor")
                .output_type("crate::proto::Sensors")
                .codec_path("tonic::codec::ProstCodec")
                .build(),
        )
        .method(
            Method::builder()
                .name("update_sensors")
                .route_name("UpdateSensors")
                .input_type("crate::proto::SensorUpdate")
                .output_type("crate::proto::Sensors")
                .codec_path("tonic::codec::ProstCodec")
                .build(),
        )
        .build();

    Builder::new().compile(&[service]);
}
