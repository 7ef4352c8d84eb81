//! Docker-backed execution adapter
//!
//! Every execution gets a throwaway container: no network, capped memory and
//! process count, program killed by `timeout` at the wall-clock ceiling. The
//! container is force-removed whatever the outcome.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use bollard::{
    container::LogOutput,
    exec::{CreateExecOptions, StartExecResults},
    models::ContainerCreateBody,
    query_parameters::{CreateContainerOptionsBuilder, RemoveContainerOptionsBuilder},
    Docker,
};
use futures::StreamExt;
use uuid::Uuid;

use crate::{
    config::SandboxConfig,
    constants::TIMEOUT_EXIT_CODE,
    harness::LanguageHarness,
    models::Language,
};

use super::{ExecutionAdapter, ExecutionOutput, ExecutionRequest, SandboxError};

/// Largest base64 chunk passed on one command line
const WRITE_CHUNK_SIZE: usize = 64 * 1024;

const STDIN_PATH: &str = "/workspace/stdin.json";

/// Output of one `docker exec`
#[derive(Debug, Default)]
struct ExecResult {
    stdout: String,
    stderr: String,
    exit_code: i64,
}

/// Execution adapter running programs in Docker containers
pub struct DockerExecutor {
    docker: Docker,
    config: SandboxConfig,
    /// Keeps the container alive between execs
    idle_command: Vec<String>,
}

impl DockerExecutor {
    /// Create a new Docker executor
    pub fn new(docker: Docker, config: SandboxConfig) -> Self {
        Self {
            docker,
            config,
            idle_command: vec!["sleep".to_string(), "infinity".to_string()],
        }
    }

    /// Get Docker image for a language
    fn image_for(&self, language: Language) -> &str {
        match language {
            Language::Python => &self.config.python_image,
            Language::JavaScript => &self.config.javascript_image,
        }
    }

    /// Create and start an idle sandbox container
    async fn create_container(&self, language: Language) -> Result<String, SandboxError> {
        let run_id = Uuid::new_v4();
        let container_name = format!("acodeaday-run-{}", run_id);

        let options = CreateContainerOptionsBuilder::default()
            .name(&container_name)
            .build();

        let memory_bytes = (self.config.memory_limit_mb * 1024 * 1024) as i64;
        let host_config = bollard::models::HostConfig {
            memory: Some(memory_bytes),
            memory_swap: Some(memory_bytes),
            cpu_period: Some(100000),
            cpu_quota: Some(100000), // 1 CPU
            network_mode: Some("none".to_string()),
            pids_limit: Some(self.config.pids_limit),
            readonly_rootfs: Some(false),
            ..Default::default()
        };

        let body = ContainerCreateBody {
            image: Some(self.image_for(language).to_string()),
            cmd: Some(self.idle_command.clone()),
            host_config: Some(host_config),
            working_dir: Some("/workspace".to_string()),
            env: Some(vec!["LANG=C.UTF-8".to_string(), "PYTHONIOENCODING=utf-8".to_string()]),
            labels: Some(HashMap::from([(
                "acodeaday.run".to_string(),
                run_id.to_string(),
            )])),
            ..Default::default()
        };

        let container = self.docker.create_container(Some(options), body).await?;

        if let Err(err) = self
            .docker
            .start_container(&container.id, None::<bollard::query_parameters::StartContainerOptions>)
            .await
        {
            if let Err(cleanup) = self.remove_container(&container.id).await {
                tracing::warn!(
                    container_id = %container.id,
                    error = %cleanup,
                    "Failed to remove container that never started"
                );
            }
            return Err(err.into());
        }

        tracing::debug!(container_id = %container.id, language = %language, "Sandbox container started");

        Ok(container.id)
    }

    /// Remove a container
    async fn remove_container(&self, container_id: &str) -> Result<(), SandboxError> {
        let options = RemoveContainerOptionsBuilder::default().force(true).build();
        self.docker.remove_container(container_id, Some(options)).await?;
        Ok(())
    }

    /// Write a file to the container in base64 chunks
    async fn write_file(&self, container_id: &str, path: &str, content: &str) -> Result<(), SandboxError> {
        let encoded = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, content);

        let truncate = format!(": > {}.b64", path);
        self.exec_checked(container_id, &truncate).await?;

        for chunk in encoded.as_bytes().chunks(WRITE_CHUNK_SIZE) {
            // base64 output is ASCII, so chunking bytes keeps valid UTF-8
            let chunk = String::from_utf8_lossy(chunk);
            let cmd = format!("printf '%s' '{}' >> {}.b64", chunk, path);
            self.exec_checked(container_id, &cmd).await?;
        }

        let decode = format!("base64 -d {path}.b64 > {path} && rm {path}.b64");
        self.exec_checked(container_id, &decode).await?;

        Ok(())
    }

    /// Execute a setup command, failing on non-zero exit
    async fn exec_checked(&self, container_id: &str, cmd: &str) -> Result<(), SandboxError> {
        let result = self.exec_command(container_id, cmd).await?;
        if result.exit_code != 0 {
            return Err(SandboxError::Setup(format!(
                "command exited with {}: {}",
                result.exit_code, result.stderr
            )));
        }
        Ok(())
    }

    /// Execute a command in the container
    async fn exec_command(&self, container_id: &str, cmd: &str) -> Result<ExecResult, SandboxError> {
        let exec = self
            .docker
            .create_exec(
                container_id,
                CreateExecOptions {
                    cmd: Some(vec!["/bin/sh", "-c", cmd]),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    ..Default::default()
                },
            )
            .await?;

        let output = self.docker.start_exec(&exec.id, None).await?;

        let mut stdout = String::new();
        let mut stderr = String::new();

        if let StartExecResults::Attached { mut output, .. } = output {
            while let Some(msg) = output.next().await {
                match msg? {
                    LogOutput::StdOut { message } => {
                        stdout.push_str(&String::from_utf8_lossy(&message));
                    }
                    LogOutput::StdErr { message } => {
                        stderr.push_str(&String::from_utf8_lossy(&message));
                    }
                    _ => {}
                }
            }
        }

        let inspect = self.docker.inspect_exec(&exec.id).await?;
        let exit_code = inspect.exit_code.unwrap_or(-1);

        Ok(ExecResult {
            stdout,
            stderr,
            exit_code,
        })
    }

    /// Write the program and its input, then run it under `timeout`
    async fn run_program(
        &self,
        container_id: &str,
        request: &ExecutionRequest,
    ) -> Result<ExecutionOutput, SandboxError> {
        let harness = LanguageHarness::for_language(request.language);
        let source_path = format!("/workspace/{}", harness.source_file());

        self.write_file(container_id, &source_path, &request.source).await?;
        self.write_file(container_id, STDIN_PATH, &request.stdin).await?;

        let run_cmd = format!(
            "timeout {}s {} < {}",
            self.config.timeout_seconds,
            harness.run_command(),
            STDIN_PATH
        );

        let start = Instant::now();
        let result = self.exec_command(container_id, &run_cmd).await?;
        let wall_time_ms = start.elapsed().as_millis() as i64;

        Ok(ExecutionOutput {
            stdout: result.stdout,
            stderr: result.stderr,
            exit_code: result.exit_code,
            timed_out: result.exit_code == TIMEOUT_EXIT_CODE,
            wall_time_ms,
        })
    }
}

#[async_trait]
impl ExecutionAdapter for DockerExecutor {
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionOutput, SandboxError> {
        let container_id = self.create_container(request.language).await?;

        let result = self.run_program(&container_id, &request).await;

        if let Err(e) = self.remove_container(&container_id).await {
            tracing::warn!(container_id = %container_id, error = %e, "Failed to remove sandbox container");
        }

        match &result {
            Ok(output) => tracing::info!(
                language = %request.language,
                exit_code = output.exit_code,
                timed_out = output.timed_out,
                wall_time_ms = output.wall_time_ms,
                "Sandbox execution finished"
            ),
            Err(e) => tracing::error!(language = %request.language, error = %e, "Sandbox execution failed"),
        }

        result
    }
}
