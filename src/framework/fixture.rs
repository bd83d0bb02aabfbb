//! Fixture protocol: setup/teardown scoped around one case body.

use crate::core::errors::Result;

/// Per-case resource scope.
///
/// `setup` runs before the case body; `teardown` runs on **every** exit path
/// of the body (normal return, fatal-assertion abort, panic). Teardown is
/// infallible: it is invoked from a drop guard, where there is nowhere left
/// to propagate an error to.
pub trait Fixture {
    /// Acquire per-case resources. A failure aborts the case before its body runs.
    fn setup(&mut self) -> Result<()>;

    /// Release per-case resources.
    fn teardown(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingFixture {
        teardowns: Rc<Cell<u32>>,
    }

    impl Fixture for CountingFixture {
        fn setup(&mut self) -> Result<()> {
            Ok(())
        }

        fn teardown(&mut self) {
            self.teardowns.set(self.teardowns.get() + 1);
        }
    }

    #[test]
    fn fixture_object_is_usable_through_dyn() {
        let teardowns = Rc::new(Cell::new(0));
        let mut fixture: Box<dyn Fixture> = Box::new(CountingFixture {
            teardowns: Rc::clone(&teardowns),
        });
        fixture.setup().expect("setup");
        fixture.teardown();
        assert_eq!(teardowns.get(), 1);
    }
}
