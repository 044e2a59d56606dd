// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Gateway chain planning for assh
//!
//! A target such as `db/edge` names the destination `db` reached through the
//! explicit hop `edge`. Each gateway configured for the last segment adds one
//! candidate chain:
//!
//! * `direct` with no hops: `nc db 22`
//! * `direct` with hops: `ssh edge nc db 22`
//! * gateway `bastion`: `ssh edge/bastion nc db 22`
//!
//! The nested `ssh edge/bastion` is itself resolved by assh when it is
//! configured as the `ProxyCommand`, which is how chains of any length are
//! built from single links.

pub mod path;
pub mod planner;

pub use path::HostPath;
pub use planner::{plan, ConnectionAttempt, Gateway, Hop, ProxyCommands, Target, DIRECT};
