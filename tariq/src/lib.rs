//! # Tariq: controllers and handlers bound to routes
//!
//! Tariq turns the methods of a controller type into routes and fills
//! their inputs by type from a dependency registry:
//!
//! - `get_by(id: i64)` is served as `GET /{param0:int}`
//! - fields and arguments are injected from values bound on the [`Engine`]
//! - path parameters are converted to the argument types they feed
//! - return values are written as text, JSON, views or statuses
//!
//! ```
//! use tariq::prelude::*;
//!
//! #[derive(Default, Inject)]
//! struct Greeter {
//!     greeting: String,
//! }
//!
//! #[controller]
//! impl Greeter {
//!     pub fn get_by(&self, name: String) -> String {
//!         format!("{}, {name}!", self.greeting)
//!     }
//! }
//!
//! let engine = Engine::builder().bind(String::from("Hello")).build();
//! let mut router = Router::new();
//! engine.controller::<Greeter>(&mut router);
//!
//! let ctx = router.serve(Method::GET, "/world");
//! assert_eq!(ctx.body_text(), "Hello, world!");
//! ```

extern crate self as tariq;

pub use tariq_container::*;
pub use tariq_macros::{Inject, controller};
pub use tariq_mvc::*;
pub use tariq_support as support;

/// The items most controllers need.
pub mod prelude {
    pub use crate::{
        Context, Controller, ControllerActivator, Dependencies, Engine, Inject, Json, Method, Party, Router,
        StatusCode, View, controller,
    };
}
