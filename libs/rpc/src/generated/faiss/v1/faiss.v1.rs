// @generated
// This file is @generated by prost-build.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Vector {
    #[prost(float, repeated, tag = "1")]
    pub val: ::prost::alloc::vec::Vec<f32>,
}
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Neighbor {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(float, tag = "2")]
    pub score: f32,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SearchRequest {
    #[prost(message, optional, tag = "1")]
    pub query: ::core::option::Option<Vector>,
    #[prost(uint64, tag = "2")]
    pub k: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SearchResponse {
    #[prost(message, repeated, tag = "1")]
    pub neighbors: ::prost::alloc::vec::Vec<Neighbor>,
}
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct SearchByIdRequest {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(uint64, tag = "2")]
    pub k: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SearchByIdResponse {
    #[prost(int64, tag = "1")]
    pub request_id: i64,
    #[prost(message, repeated, tag = "2")]
    pub neighbors: ::prost::alloc::vec::Vec<Neighbor>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HeartbeatResponse {
    #[prost(string, tag = "1")]
    pub message: ::prost::alloc::string::String,
}
include!("faiss.v1.tonic.rs");
// @@protoc_insertion_point(module)
