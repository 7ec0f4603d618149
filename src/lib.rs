//! # vfg-rs: Path-Sensitive Value Graphs in Rust
//!
//! **`vfg-rs`** is the flow core of a static type analyzer for a dynamically
//! typed bytecode language: a control-flow graph whose program points carry
//! **bindings** of abstract values to variables, and a solver that decides
//! whether a set of bindings can be simultaneously live on some real
//! execution path. A bytecode-driven abstract interpreter builds the graph
//! as it simulates instructions and queries the solver at branch and merge
//! points, e.g. to narrow a union after an `isinstance`-style check or to
//! decide whether a variable could be undefined.
//!
//! ## What is a path-sensitive value graph?
//!
//! Merging control paths never collapses values: a variable that is `int` on
//! one branch and `str` on the other simply holds two bindings, each tagged
//! with the node where it was created and with **origin sets** — alternative
//! justifications, each a set of other bindings that must all be live for
//! this one to arise. Asking "can `x = int` and `y = None` hold at once
//! here?" is then a satisfiability question over reachability, per-variable
//! exclusivity, and origin justification, answered by
//! [`Vfg::has_combination`][crate::vfg::Vfg::has_combination].
//!
//! ## Key features
//!
//! - **Manager-centric architecture**: one [`Vfg`][crate::vfg::Vfg] owns
//!   every node, variable and binding of an analysis unit in append-only
//!   arenas and hands out lightweight `Copy` ids.
//! - **Opaque payloads**: the engine is generic over the abstract value
//!   type and only ever compares it for equality — the value catalog lives
//!   outside.
//! - **Cached to stay tractable**: reachability is memoized per source
//!   node, solver answers per (node, goal set); both revalidate lazily as
//!   the graph grows.
//! - **Terminating by construction**: cyclic graphs and self-referential
//!   origins are handled by an explicit in-progress guard, and a caller
//!   supplied step budget bounds adversarial inputs, resolving to a sound
//!   conservative answer instead of hanging.
//!
//! ## Basic usage
//!
//! ```rust
//! use vfg_rs::vfg::Vfg;
//!
//! // One analysis unit.
//! let vfg: Vfg<&str> = Vfg::new();
//!
//! // entry -> then / else -> merge
//! let entry = vfg.new_node(&[]);
//! let then_ = vfg.new_node(&[entry]);
//! let else_ = vfg.new_node(&[entry]);
//! let merge = vfg.new_node(&[then_, else_]);
//!
//! // x is an int on one branch, a str on the other.
//! let x = vfg.new_variable_named("x");
//! let x_int = vfg.bind(x, then_, "int", &[]);
//! let x_str = vfg.bind(x, else_, "str", &[]);
//!
//! // Both survive the merge...
//! assert_eq!(vfg.visible_bindings(x, merge).len(), 2);
//!
//! // ...but never jointly: a variable holds one value per path.
//! assert!(vfg.has_combination(merge, &[x_int]));
//! assert!(vfg.has_combination(merge, &[x_str]));
//! assert!(!vfg.has_combination(merge, &[x_int, x_str]));
//! ```
//!
//! ## Core components
//!
//! - **[`vfg`]**: the [`Vfg`][crate::vfg::Vfg] manager — graph construction
//!   and every query.
//! - **[`solver`]**: the joint-liveness search behind `has_combination`.
//! - **[`stack`]**: the interpreter's operand stack of variables.

pub mod bitset;
pub mod error;
pub mod reference;
pub mod solver;
pub mod stack;
pub mod vfg;

mod binding;
mod node;
mod reach;
mod variable;
