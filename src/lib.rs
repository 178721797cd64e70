// SPDX-License-Identifier: MIT

//! stategraph: a workflow engine for directed graphs of computation steps
//! over shared JSON state, with conditional branching, bounded loops, and
//! an execution trace per run.

pub mod error;
pub mod server;
pub mod tools;
pub mod workflow;
