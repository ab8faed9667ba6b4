// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Generated protobuf types and tonic stubs for `proto/auth.proto`.

tonic::include_proto!("auth");
