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

use std::fmt;
use std::str::FromStr;

use crate::error::AsshError;

/// A slash-separated host path: `destination[/hop1[/hop2...]]`
///
/// Segment 0 is the final destination; the remaining segments are explicit
/// intermediate hosts given by the caller, in the order they are to be
/// reached through `ssh <hop1>/<hop2>/...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPath {
    segments: Vec<String>,
}

impl HostPath {
    pub fn parse(spec: &str) -> Result<Self, AsshError> {
        let segments: Vec<String> = spec.split('/').map(str::to_string).collect();
        if segments[0].trim().is_empty() {
            return Err(AsshError::InvalidHostPath(spec.to_string()));
        }
        Ok(Self { segments })
    }

    /// Final destination host (segment 0)
    pub fn destination(&self) -> &str {
        &self.segments[0]
    }

    /// Explicit intermediate hops (segments after the destination)
    pub fn hops(&self) -> &[String] {
        &self.segments[1..]
    }

    /// Last segment; gateways and the companion command are resolved for it
    pub fn last(&self) -> &str {
        self.segments
            .last()
            .map(String::as_str)
            .unwrap_or_else(|| self.destination())
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl FromStr for HostPath {
    type Err = AsshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for HostPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}
