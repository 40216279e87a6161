//! CLI command builder.
//!
//! A command renders to `<group> <action> --<Name> <value>... --JsonOutput`.
//! Multi-valued arguments repeat their flag.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::JSON_OUTPUT_FLAG;

/// A single named argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandArg {
    pub name: String,
    pub value: String,
}

/// A command to run against the cloud CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudCommand {
    pub group: String,
    pub action: String,
    pub args: Vec<CommandArg>,
}

/// Kind of solution data to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolutionType {
    TaskArtifacts,
    AgentLog,
    AuroraLog,
    AuroraDatabase,
}

impl SolutionType {
    /// Every type fetched by a full solution download, in download order.
    pub const ALL: [SolutionType; 4] = [
        SolutionType::TaskArtifacts,
        SolutionType::AgentLog,
        SolutionType::AuroraLog,
        SolutionType::AuroraDatabase,
    ];
}

impl fmt::Display for SolutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolutionType::TaskArtifacts => "TaskArtifacts",
            SolutionType::AgentLog => "AgentLog",
            SolutionType::AuroraLog => "AuroraLog",
            SolutionType::AuroraDatabase => "AuroraDatabase",
        };
        f.write_str(s)
    }
}

impl CloudCommand {
    pub fn new(group: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            action: action.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument.
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.push(CommandArg {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Append one argument per value, all under the same name.
    pub fn args<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for value in values {
            self = self.arg(name, value);
        }
        self
    }

    /// First value of the named argument.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.args.iter().find(|a| a.name == name).map(|a| a.value.as_str())
    }

    /// All values of the named argument.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.args
            .iter()
            .filter(|a| a.name == name)
            .map(|a| a.value.as_str())
            .collect()
    }

    /// `group action` label used in logs and errors.
    pub fn label(&self) -> String {
        format!("{} {}", self.group, self.action)
    }

    /// Render to process arguments (excluding the program itself).
    pub fn to_argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(3 + self.args.len() * 2);
        argv.push(self.group.clone());
        argv.push(self.action.clone());
        for arg in &self.args {
            argv.push(format!("--{}", arg.name));
            argv.push(arg.value.clone());
        }
        argv.push(JSON_OUTPUT_FLAG.to_string());
        argv
    }

    // Known commands

    /// List the simulation with the given id.
    pub fn list_simulation(simulation_id: &str) -> Self {
        Self::new("simulation", "list").arg("SimulationId", simulation_id)
    }

    /// List every simulation of an execution.
    pub fn list_execution(execution_id: &str) -> Self {
        Self::new("simulation", "list").arg("ExecutionId", execution_id)
    }

    /// Download data hub files matching remote glob patterns.
    pub fn datahub_download<S: Into<String>>(
        patterns: impl IntoIterator<Item = S>,
        output_directory: &str,
    ) -> Self {
        Self::new("datahub", "download")
            .args("RemoteGlobPatterns", patterns)
            .arg("OutputDirectory", output_directory)
    }

    /// Upload local files matching glob patterns into a data hub folder.
    pub fn datahub_upload<S: Into<String>>(
        local_folder: &str,
        remote_folder: &str,
        patterns: impl IntoIterator<Item = S>,
        is_versioned: bool,
    ) -> Self {
        Self::new("datahub", "upload")
            .arg("LocalFolder", local_folder)
            .arg("RemoteFolder", remote_folder)
            .args("GlobPatterns", patterns)
            .arg("IsVersioned", is_versioned.to_string())
    }

    /// Download one kind of solution data.
    pub fn solution_download(
        solution_id: &str,
        output_directory: &str,
        solution_type: SolutionType,
        overwrite: bool,
    ) -> Self {
        Self::new("solution", "download")
            .arg("SolutionId", solution_id)
            .arg("OutputDirectory", output_directory)
            .arg("SolutionType", solution_type.to_string())
            .arg("Overwrite", overwrite.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_execution_argv() {
        let cmd = CloudCommand::list_execution("exec-1");
        assert_eq!(
            cmd.to_argv(),
            vec!["simulation", "list", "--ExecutionId", "exec-1", "--JsonOutput"]
        );
        assert_eq!(cmd.label(), "simulation list");
    }

    #[test]
    fn test_multi_valued_args_repeat_flag() {
        let cmd = CloudCommand::datahub_download(["a/*.parquet", "b/*.csv"], "/output");
        assert_eq!(cmd.get_all("RemoteGlobPatterns"), vec!["a/*.parquet", "b/*.csv"]);
        assert_eq!(cmd.get("OutputDirectory"), Some("/output"));
        let argv = cmd.to_argv();
        assert_eq!(argv.iter().filter(|a| *a == "--RemoteGlobPatterns").count(), 2);
    }

    #[test]
    fn test_upload_flags() {
        let cmd = CloudCommand::datahub_upload("/output", "Project/Results", ["*.parquet"], false);
        assert_eq!(cmd.get("IsVersioned"), Some("false"));
        assert_eq!(cmd.get("RemoteFolder"), Some("Project/Results"));
    }

    #[test]
    fn test_solution_types_in_order() {
        let names: Vec<String> = SolutionType::ALL.iter().map(|t| t.to_string()).collect();
        assert_eq!(names, vec!["TaskArtifacts", "AgentLog", "AuroraLog", "AuroraDatabase"]);
    }
}
