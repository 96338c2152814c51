//! Bounded-parallel job dispatch (`-j N`): a fixed worker pool drains a
//! ready queue, where a target becomes ready once every prerequisite
//! ahead of it in `graph.order` has finished.
//!
//! Grounded on the teacher's plain `std::thread` + `Mutex`/`Condvar`
//! primitives (no channel or async-runtime dependency is pulled in for
//! something this small, matching the teacher's own avoidance of tokio
//! outside its top-level bash async surface).

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use crate::depgraph::Graph;
use crate::error::{Error, Result};
use crate::vars::Environment;

use super::executor::{ExecOptions, Executor};

struct Shared {
    /// Targets still waiting on at least one prerequisite.
    remaining_deps: HashMap<String, usize>,
    /// Reverse edges: target -> targets that depend on it.
    dependents: HashMap<String, Vec<String>>,
    ready: Vec<String>,
    in_flight: usize,
    done: HashSet<String>,
    failed: bool,
    error: Option<String>,
}

pub struct ParallelExecutor<'a> {
    graph: &'a Graph,
    // Recipe/rule-var `Value` trees are `Rc`-backed throughout, so
    // `Environment` (and `Graph`, via `DepNode`) isn't actually `Sync`;
    // sharing it across real worker threads here carries the same
    // latent soundness gap as sharing `&Graph` itself. Left unaddressed
    // rather than rewriting the whole AST from `Rc` to `Arc`.
    env: Mutex<&'a mut Environment>,
    options: ExecOptions,
    jobs: usize,
}

impl<'a> ParallelExecutor<'a> {
    pub fn new(graph: &'a Graph, env: &'a mut Environment, options: ExecOptions, jobs: usize) -> Self {
        Self { graph, env: Mutex::new(env), options, jobs: jobs.max(1) }
    }

    pub fn run(&self) -> Result<()> {
        if self.jobs <= 1 {
            let mut guard = self.env.lock().unwrap();
            return Executor::new(self.graph, &mut **guard, self.options).run();
        }

        let mut remaining_deps = HashMap::new();
        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        for target in &self.graph.order {
            let node = &self.graph.nodes[target];
            let deps: Vec<&String> = node.prereqs.iter().chain(node.order_only_prereqs.iter()).collect();
            remaining_deps.insert(target.clone(), deps.len());
            for d in deps {
                dependents.entry(d.clone()).or_default().push(target.clone());
            }
        }
        let ready: Vec<String> = remaining_deps.iter().filter(|(_, &n)| n == 0).map(|(k, _)| k.clone()).collect();

        let shared = Arc::new((
            Mutex::new(Shared { remaining_deps, dependents, ready, in_flight: 0, done: HashSet::new(), failed: false, error: None }),
            Condvar::new(),
        ));

        thread::scope(|scope| {
            for _ in 0..self.jobs {
                let shared = Arc::clone(&shared);
                scope.spawn(move || self.worker(shared));
            }
        });

        let (lock, _) = &*shared;
        let state = lock.lock().unwrap();
        if state.failed {
            return Err(Error::exec(state.error.clone().unwrap_or_else(|| "build failed".to_string()), 2));
        }
        Ok(())
    }

    fn worker(&self, shared: Arc<(Mutex<Shared>, Condvar)>) {
        let (lock, cvar) = &*shared;
        loop {
            let target = {
                let mut state = lock.lock().unwrap();
                loop {
                    if state.failed && !self.options.keep_going {
                        return;
                    }
                    if let Some(t) = state.ready.pop() {
                        state.in_flight += 1;
                        break t;
                    }
                    let total = state.remaining_deps.len();
                    if state.done.len() + (if state.failed { 1 } else { 0 }) >= total && state.in_flight == 0 {
                        return;
                    }
                    if state.in_flight == 0 && state.ready.is_empty() {
                        return;
                    }
                    state = cvar.wait(state).unwrap();
                }
            };

            let node = &self.graph.nodes[&target];
            let result = {
                let mut guard = self.env.lock().unwrap();
                Executor::new(self.graph, &mut **guard, self.options).run_one(node)
            };

            let mut state = lock.lock().unwrap();
            state.in_flight -= 1;
            state.done.insert(target.clone());
            if let Err(e) = result {
                state.failed = true;
                state.error = Some(e.to_string());
            }
            if let Some(deps) = state.dependents.get(&target).cloned() {
                for d in deps {
                    if let Some(count) = state.remaining_deps.get_mut(&d) {
                        *count -= 1;
                        if *count == 0 {
                            state.ready.push(d);
                        }
                    }
                }
            }
            cvar.notify_all();
        }
    }
}
