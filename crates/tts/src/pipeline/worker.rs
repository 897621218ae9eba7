use std::{path::PathBuf, process::Stdio};

use async_trait::async_trait;
use kokoro_config::WorkerConfig;
use serde::Serialize;
use tokio::{
    io::{AsyncWriteExt, BufReader},
    process::{Child, ChildStdin, ChildStdout, Command},
};

use super::{AudioChunk, Pipeline, PipelineFactory, frame};
use crate::{
    error::{Result, TtsError},
    voice::{LangCode, VoicePack, VoiceStore},
};

/// Spawns one inference worker process per language code
pub struct WorkerPipelineFactory {
    config: WorkerConfig,
    model: PathBuf,
    voices: VoiceStore,
}

impl WorkerPipelineFactory {
    pub const fn new(config: WorkerConfig, model: PathBuf, voices: VoiceStore) -> Self {
        Self { config, model, voices }
    }

    fn command(&self, lang: LangCode) -> Command {
        let lang = lang.to_string();
        let model = self.model.to_string_lossy();

        let mut cmd = Command::new(&self.config.command);
        cmd.args(
            self.config
                .args
                .iter()
                .map(|arg| arg.replace("{lang}", &lang).replace("{model}", &model)),
        );
        cmd.envs(&self.config.env);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl PipelineFactory for WorkerPipelineFactory {
    async fn create(&self, lang: LangCode) -> Result<Box<dyn Pipeline>> {
        let mut child = self.command(lang).spawn().map_err(|e| {
            TtsError::Pipeline(format!(
                "failed to spawn inference worker '{}': {e}",
                self.config.command
            ))
        })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(TtsError::Pipeline("inference worker has no stdio pipes".to_string()));
        };

        tracing::debug!(%lang, pid = child.id(), "spawned inference worker");

        Ok(Box::new(WorkerPipeline {
            lang,
            _child: child,
            stdin,
            stdout: BufReader::new(stdout),
            voices: self.voices.clone(),
            healthy: true,
        }))
    }
}

/// Pipeline backed by a worker process speaking the [`frame`] protocol
///
/// Dropping it kills the process.
pub struct WorkerPipeline {
    lang: LangCode,
    // held so the process is killed on drop
    _child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    voices: VoiceStore,
    healthy: bool,
}

#[derive(Serialize)]
struct WorkerRequest<'a> {
    text: &'a str,
    voice: &'a str,
}

impl WorkerPipeline {
    /// Send one request and read the worker's reply
    ///
    /// `Err` means the process or the stream is broken; a request the worker
    /// rejected comes back as [`frame::Utterance::Failed`].
    async fn exchange(&mut self, text: &str, voice: &VoicePack) -> Result<frame::Utterance> {
        let voice_path = voice
            .path
            .to_str()
            .ok_or_else(|| TtsError::Pipeline(format!("voice path is not UTF-8: {}", voice.path.display())))?;

        let mut line = serde_json::to_vec(&WorkerRequest { text, voice: voice_path })
            .map_err(|e| TtsError::Pipeline(format!("failed to encode worker request: {e}")))?;
        line.push(b'\n');

        self.stdin.write_all(&line).await.map_err(write_error)?;
        self.stdin.flush().await.map_err(write_error)?;

        frame::read_utterance(&mut self.stdout).await
    }
}

#[async_trait]
impl Pipeline for WorkerPipeline {
    async fn load_voice(&mut self, name: &str) -> Result<VoicePack> {
        self.voices.resolve(name).await
    }

    async fn generate(&mut self, text: &str, voice: &VoicePack) -> Result<Vec<AudioChunk>> {
        // Stays false if this future is dropped mid-exchange: unread frames
        // would otherwise answer the next request
        self.healthy = false;

        match self.exchange(text, voice).await {
            Ok(frame::Utterance::Audio(chunks)) => {
                self.healthy = true;
                Ok(chunks)
            }
            Ok(frame::Utterance::Failed(message)) => {
                self.healthy = true;
                Err(TtsError::Pipeline(message))
            }
            Err(e) => {
                tracing::warn!(lang = %self.lang, "inference worker unusable: {e}");
                Err(e)
            }
        }
    }

    fn is_healthy(&self) -> bool {
        self.healthy
    }
}

fn write_error(e: std::io::Error) -> TtsError {
    TtsError::Pipeline(format!("failed to write to inference worker: {e}"))
}

#[cfg(all(test, unix))]
mod tests {
    use indexmap::IndexMap;

    use super::*;

    // Replies to every request with one chunk [1.0, -0.5]
    const ECHO_WORKER: &str = r"while IFS= read -r line; do
  printf '\001\002\000\000\000\000\000\200\077\000\000\000\277\000'
done";

    // Rejects every request with `bad lang <lang>`
    const REJECTING_WORKER: &str = r#"while IFS= read -r line; do
  printf '\002\012\000\000\000'
  printf 'bad lang %s' "$1"
done"#;

    // Answers the first request after a delay with [1.0], later ones at once with [-0.5]
    const SLOW_FIRST_WORKER: &str = r"n=0
while IFS= read -r line; do
  n=$((n + 1))
  if [ $n -eq 1 ]; then
    sleep 0.5
    printf '\001\001\000\000\000\000\000\200\077\000'
  else
    printf '\001\001\000\000\000\000\000\000\277\000'
  fi
done";

    fn factory(script: &str, voices: &tempfile::TempDir) -> WorkerPipelineFactory {
        let config = WorkerConfig {
            command: "sh".to_string(),
            args: vec!["-c".into(), script.into(), "worker".into(), "{lang}".into()],
            env: IndexMap::new(),
        };
        WorkerPipelineFactory::new(config, PathBuf::from("/models/kokoro.pth"), VoiceStore::new(voices.path()))
    }

    fn voices() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("af_heart.pt"), b"voice").unwrap();
        std::fs::write(dir.path().join("jf_alpha.pt"), b"voice").unwrap();
        dir
    }

    async fn spawn(factory: &WorkerPipelineFactory, lang: char) -> Box<dyn Pipeline> {
        match factory.create(LangCode::new(lang)).await {
            Ok(pipeline) => pipeline,
            Err(e) => panic!("worker failed to spawn: {e}"),
        }
    }

    #[tokio::test]
    async fn worker_streams_chunks_for_each_request() {
        let voices = voices();
        let factory = factory(ECHO_WORKER, &voices);
        let mut pipeline = spawn(&factory, 'a').await;

        let voice = pipeline.load_voice("af_heart").await.unwrap();
        for _ in 0..2 {
            let chunks = pipeline.generate("Hello there.", &voice).await.unwrap();
            assert_eq!(chunks, vec![vec![1.0, -0.5]]);
        }
        assert!(pipeline.is_healthy());
    }

    #[tokio::test]
    async fn worker_rejection_keeps_pipeline_usable() {
        let voices = voices();
        let factory = factory(REJECTING_WORKER, &voices);
        let mut pipeline = spawn(&factory, 'j').await;

        let voice = pipeline.load_voice("jf_alpha").await.unwrap();
        let err = pipeline.generate("konnichiwa", &voice).await.unwrap_err();

        assert!(matches!(err, TtsError::Pipeline(ref m) if m == "bad lang j"));
        assert!(pipeline.is_healthy());
    }

    #[tokio::test]
    async fn exited_worker_is_marked_unhealthy() {
        let voices = voices();
        let factory = factory("exit 0", &voices);
        let mut pipeline = spawn(&factory, 'a').await;

        let voice = pipeline.load_voice("af_heart").await.unwrap();
        let err = pipeline.generate("Hello", &voice).await.unwrap_err();

        assert!(matches!(err, TtsError::Pipeline(_)));
        assert!(!pipeline.is_healthy());
    }

    #[tokio::test]
    async fn cancelled_exchange_marks_pipeline_unhealthy() {
        let voices = voices();
        let factory = factory(SLOW_FIRST_WORKER, &voices);
        let mut pipeline = spawn(&factory, 'a').await;
        let voice = pipeline.load_voice("af_heart").await.unwrap();

        let cancelled = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            pipeline.generate("first", &voice),
        )
        .await;
        assert!(cancelled.is_err());

        // the stale reply is still in the pipe, so the pipeline must not be reused
        assert!(!pipeline.is_healthy());

        // a replacement worker answers its own request
        let mut replacement = spawn(&factory, 'a').await;
        let chunks = replacement.generate("first", &voice).await.unwrap();
        assert_eq!(chunks, vec![vec![1.0]]);
        let chunks = replacement.generate("second", &voice).await.unwrap();
        assert_eq!(chunks, vec![vec![-0.5]]);
        assert!(replacement.is_healthy());
    }

    #[tokio::test]
    async fn missing_voice_is_reported_before_inference() {
        let voices = voices();
        let factory = factory(ECHO_WORKER, &voices);
        let mut pipeline = spawn(&factory, 'a').await;

        let err = pipeline.load_voice("af_missing").await.unwrap_err();

        assert!(matches!(err, TtsError::VoiceNotFound(_)));
        assert!(pipeline.is_healthy());
    }

    #[tokio::test]
    async fn missing_worker_binary_fails_to_spawn() {
        let voices = voices();
        let config = WorkerConfig {
            command: "/nonexistent/kokoro-worker".to_string(),
            ..WorkerConfig::default()
        };
        let factory = WorkerPipelineFactory::new(config, PathBuf::from("/m.pth"), VoiceStore::new(voices.path()));

        let Err(err) = factory.create(LangCode::new('a')).await else {
            panic!("expected spawn failure");
        };

        assert!(err.to_string().contains("failed to spawn inference worker"));
    }
}
