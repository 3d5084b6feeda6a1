use std::future::{Future, IntoFuture};

use futures_util::future::{join_all, BoxFuture};
use futures_util::FutureExt;

/// Action created once and awaited later, alone or together with other actions.
/// Nothing runs until the action is awaited
pub struct ParallelAction<'a, T> {
    future: BoxFuture<'a, T>,
}

impl<'a, T> ParallelAction<'a, T> {
    pub fn new(future: impl Future<Output = T> + Send + 'a) -> Self {
        Self {
            future: future.boxed(),
        }
    }

    pub async fn run(self) -> T {
        self.future.await
    }
}

impl<'a, T> IntoFuture for ParallelAction<'a, T> {
    type Output = T;
    type IntoFuture = BoxFuture<'a, T>;

    fn into_future(self) -> Self::IntoFuture {
        self.future
    }
}

/// Runs an action created with [`ParallelAction::new`]
pub async fn run_parallel_action<T>(action: ParallelAction<'_, T>) -> T {
    action.run().await
}

/// Runs actions of the same kind concurrently, results keep the input order
pub async fn run_all<'a, T>(actions: impl IntoIterator<Item = ParallelAction<'a, T>>) -> Vec<T> {
    join_all(actions.into_iter().map(ParallelAction::run)).await
}
