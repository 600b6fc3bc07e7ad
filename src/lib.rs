// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Static control-flow and symbolic-stack analysis for EVM-style
//! stack-machine bytecode.
//!
//! The pipeline is: raw bytes ([`instruction::Decoder`]) -> decoded
//! instructions ([`instruction::Instruction`]) -> basic blocks
//! ([`block::segment`]) -> an initial control-flow graph
//! ([`cfg::build_initial_edges`]) -> a path-sensitive symbolic stack
//! fixpoint ([`executor::execute`]) -> recovered child contracts
//! ([`contract::find_children`]). [`program::Program`] drives the
//! whole pipeline and owns the resulting model; [`report`] renders it.

pub mod block;
pub mod cfg;
pub mod contract;
pub mod executor;
pub mod hex;
pub mod instruction;
pub mod issue;
pub mod opcode;
pub mod program;
pub mod registry;
pub mod report;
pub mod symbol;

pub use program::Program;
