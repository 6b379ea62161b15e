// @generated
// This file wires up the protobuf code generated from proto/faiss/v1/faiss.proto.
// The prost file include!()s the tonic file.

pub mod faiss {
    include!("generated/faiss/v1/faiss.v1.rs");
}
