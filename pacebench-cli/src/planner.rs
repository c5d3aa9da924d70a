//! Task Planner
//!
//! Builds the execution plan by filtering a suite's tasks with the CLI's
//! regex pattern. Registration order is kept: it is the order the suite runs
//! tasks in and the order results are reported in.

use pacebench_core::{Suite, Task};
use regex::Regex;

/// Tasks selected for execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    /// Names of the selected tasks, in registration order
    pub tasks: Vec<String>,
}

impl ExecutionPlan {
    /// Whether nothing was selected
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Whether `name` was selected
    pub fn contains(&self, name: &str) -> bool {
        self.tasks.iter().any(|t| t == name)
    }
}

/// Build an execution plan from task names
pub fn build_plan<'a>(
    names: impl IntoIterator<Item = &'a str>,
    filter: Option<&Regex>,
) -> ExecutionPlan {
    let tasks = names
        .into_iter()
        .filter(|name| filter.is_none_or(|re| re.is_match(name)))
        .map(str::to_string)
        .collect();

    ExecutionPlan { tasks }
}

/// Remove every task the plan did not select, returning the removed tasks
pub fn apply_plan(suite: &mut Suite, plan: &ExecutionPlan) -> Vec<Task> {
    let unselected: Vec<String> = suite
        .tasks()
        .iter()
        .map(Task::name)
        .filter(|name| !plan.contains(name))
        .map(str::to_string)
        .collect();

    unselected
        .iter()
        .filter_map(|name| suite.remove(name))
        .collect()
}
