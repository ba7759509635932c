//! Infrastructure 層
//!
//! ドメイン層が定義する trait の具体的な実装（Repository、外部 API）と、
//! 通信用の DTO を提供します。

pub mod dto;
pub mod repository;
pub mod spotify;
