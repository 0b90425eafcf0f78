use rayon::prelude::*;

/// Sequential mapping on the calling thread, used when a workload is too small
/// to be worth handing to a pool
pub struct SequentialExecutor;

impl SequentialExecutor {
    pub fn execute<T, R, F>(work_items: &[T], processor: F) -> Vec<R>
    where
        F: Fn(&T) -> R,
    {
        work_items.iter().map(processor).collect()
    }
}

/// Order-preserving data-parallel map backed by a dedicated rayon pool
pub struct OrderedExecutor {
    workers: usize,
}

impl OrderedExecutor {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Map every item on the pool; the output has the input's order.
    ///
    /// The pool lives only for the duration of this call and its threads are
    /// joined when it is dropped. A panic inside `processor` is propagated to
    /// the caller by rayon.
    pub fn execute<T, R, F>(
        &self,
        work_items: &[T],
        processor: F,
    ) -> Result<Vec<R>, rayon::ThreadPoolBuildError>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Send + Sync,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|index| format!("lineproc-map-{index}"))
            .build()?;

        Ok(pool.install(|| work_items.par_iter().map(&processor).collect()))
    }
}

/// Execution strategy for the order-preserving path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStrategy {
    Sequential,
    Parallel { workers: usize },
}

impl ExecutionStrategy {
    pub fn execute<T, R, F>(
        &self,
        work_items: &[T],
        processor: F,
    ) -> Result<Vec<R>, rayon::ThreadPoolBuildError>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Send + Sync,
    {
        match self {
            ExecutionStrategy::Sequential => {
                Ok(SequentialExecutor::execute(work_items, processor))
            }
            ExecutionStrategy::Parallel { workers } => {
                OrderedExecutor::new(*workers).execute(work_items, processor)
            }
        }
    }

    /// Threshold-based choice between sequential and parallel execution.
    ///
    /// The caller provides the worker count it already computed; this only
    /// compares the workload against `min_items_for_parallel`. The worker count
    /// is capped by the number of items so no idle threads are started.
    ///
    /// ```rust
    /// use lineproc::parallel::ExecutionStrategy;
    ///
    /// let strategy = ExecutionStrategy::auto(36, 50, 8);
    /// assert!(matches!(strategy, ExecutionStrategy::Sequential));
    ///
    /// let strategy = ExecutionStrategy::auto(100, 50, 8);
    /// assert_eq!(strategy, ExecutionStrategy::Parallel { workers: 8 });
    /// ```
    pub fn auto(
        work_items_count: usize,
        min_items_for_parallel: usize,
        optimal_workers: usize,
    ) -> Self {
        let workers = optimal_workers.min(work_items_count.max(1));
        if work_items_count >= min_items_for_parallel && workers > 1 {
            ExecutionStrategy::Parallel { workers }
        } else {
            ExecutionStrategy::Sequential
        }
    }

    /// Number of threads this strategy occupies
    pub fn workers(&self) -> usize {
        match self {
            ExecutionStrategy::Sequential => 1,
            ExecutionStrategy::Parallel { workers } => *workers,
        }
    }

    /// Calculate optimal workers from available cores and configuration limits.
    ///
    /// # Algorithm
    /// ```text
    /// 1. Detect available CPU cores: num_cpus::get()
    /// 2. Apply percentage: cores * thread_percentage / 100
    /// 3. Ensure minimum: max(1, result)
    /// 4. Apply config limit: min(max_threads_config, result) if max_threads_config > 0
    /// ```
    ///
    /// ```rust
    /// use lineproc::parallel::ExecutionStrategy;
    ///
    /// let workers = ExecutionStrategy::calculate_optimal_workers(0, 100);
    /// assert!(workers >= 1);
    ///
    /// let workers = ExecutionStrategy::calculate_optimal_workers(2, 100);
    /// assert!(workers <= 2);
    /// ```
    pub fn calculate_optimal_workers(max_threads_config: usize, thread_percentage: u8) -> usize {
        let available_cores = num_cpus::get();

        let workers_by_percentage =
            std::cmp::max(1, (available_cores * thread_percentage as usize) / 100);

        // 0 means no explicit limit
        if max_threads_config > 0 {
            std::cmp::min(max_threads_config, workers_by_percentage)
        } else {
            workers_by_percentage
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_executor() {
        let work_items = vec![1, 2, 3, 4, 5];
        let results = SequentialExecutor::execute(&work_items, |x| x * 2);
        assert_eq!(results, vec![2, 4, 6, 8, 10]);
    }

    #[test]
    fn test_ordered_executor_preserves_order() {
        let executor = OrderedExecutor::new(4);
        let work_items: Vec<usize> = (0..1000).collect();
        let results = executor.execute(&work_items, |x| x * 3).unwrap();

        let expected: Vec<usize> = (0..1000).map(|x| x * 3).collect();
        assert_eq!(results, expected);
    }

    #[test]
    fn test_ordered_executor_zero_workers_is_clamped() {
        let executor = OrderedExecutor::new(0);
        let work_items: &[&str] = &["a", "b"];
        let results = executor.execute(work_items, |s| s.to_uppercase()).unwrap();
        assert_eq!(results, vec!["A", "B"]);
    }

    #[test]
    fn test_execution_strategy() {
        let work_items = vec![1, 2, 3];

        let sequential = ExecutionStrategy::Sequential;
        let seq_results = sequential.execute(&work_items, |x| x * 3).unwrap();
        assert_eq!(seq_results, vec![3, 6, 9]);

        let parallel = ExecutionStrategy::Parallel { workers: 2 };
        let par_results = parallel.execute(&work_items, |x| x * 3).unwrap();
        assert_eq!(par_results, vec![3, 6, 9]);
    }

    #[test]
    fn test_auto_strategy() {
        let strategy = ExecutionStrategy::auto(5, 10, 8);
        assert!(matches!(strategy, ExecutionStrategy::Sequential));

        let strategy = ExecutionStrategy::auto(50, 10, 8);
        assert_eq!(strategy, ExecutionStrategy::Parallel { workers: 8 });

        // A single worker never pays for a pool
        let strategy = ExecutionStrategy::auto(50, 10, 1);
        assert!(matches!(strategy, ExecutionStrategy::Sequential));

        // Workers are capped by the workload
        let strategy = ExecutionStrategy::auto(3, 0, 8);
        assert_eq!(strategy.workers(), 3);
    }

    #[test]
    fn test_optimal_workers_calculation() {
        let workers = ExecutionStrategy::calculate_optimal_workers(0, 100);
        assert_eq!(workers, num_cpus::get().max(1));

        let workers = ExecutionStrategy::calculate_optimal_workers(1, 100);
        assert_eq!(workers, 1);

        // Tiny percentages still get one worker
        let workers = ExecutionStrategy::calculate_optimal_workers(0, 1);
        assert!(workers >= 1);
    }
}
