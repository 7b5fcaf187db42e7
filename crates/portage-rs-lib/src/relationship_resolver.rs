//! Utilities for turning requested packages into an ordered list of packages to build.
//!
//! # Usage
//! 1. Scan the portage roots into a [`PortageTree`](crate::PortageTree).
//! 1. Create a [`ResolverBuilder`], optionally giving it the installed packages and an ignore list.
//! 1. [`ResolverBuilder::build()`] to get a [`Resolver`].
//! 1. Either [`Resolver::resolve()`] a package and take its [`Resolver::closure()`],
//! or add every requested package to a [`BuildPlan`] and read [`BuildPlan::build_order()`].
//!
//! Dependencies that can't be found are logged and skipped, only problems with the requested packages are errors.

mod dependency_graph;
pub use dependency_graph::*;

mod closure;
pub use closure::{closure, closure_into};

mod resolver;
pub use resolver::{Resolver, DirectDependency};

mod resolver_builder;
pub use resolver_builder::ResolverBuilder;

mod build_plan;
pub use build_plan::BuildPlan;
