//! End-to-end assistance flows with fake collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use forge_chat::{
    Assistant, AssistantConfig, AssistRequest, BackendError, ChatError, ConversationMessage,
    FileGenerator, GeneratedFile, GenerationBackend, GenerationError, GenerationOutput,
    GenerationRequest, PlanStatus, PromptPair, ReplySource, TemplateFileGenerator,
};
use forge_intent::IntentType;
use forge_project::{InMemoryProjectRepository, NewProject};

/// Returns the same text every time and records the prompts it saw.
struct StaticBackend {
    reply: String,
    seen: Mutex<Vec<PromptPair>>,
}

impl StaticBackend {
    fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl GenerationBackend for StaticBackend {
    async fn generate(&self, prompts: &PromptPair) -> Result<String, BackendError> {
        self.seen.lock().push(prompts.clone());
        Ok(self.reply.clone())
    }
}

struct FailingBackend;

#[async_trait]
impl GenerationBackend for FailingBackend {
    async fn generate(&self, _prompts: &PromptPair) -> Result<String, BackendError> {
        Err(BackendError::Api {
            provider: "OpenAI".into(),
            status: 401,
            body: "invalid api key".into(),
        })
    }
}

struct SlowBackend;

#[async_trait]
impl GenerationBackend for SlowBackend {
    async fn generate(&self, _prompts: &PromptPair) -> Result<String, BackendError> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(r#"{"name": "Too Late", "description": "never seen"}"#.into())
    }
}

/// Counts generator calls.
#[derive(Default)]
struct CountingGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl FileGenerator for CountingGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GenerationOutput {
            files: vec![GeneratedFile {
                name: "README.md".into(),
                path: "README.md".into(),
                content: request.description.clone(),
                language: "markdown".into(),
            }],
        })
    }
}

struct BrokenGenerator;

#[async_trait]
impl FileGenerator for BrokenGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        Err(GenerationError::Failed("disk quota exceeded".into()))
    }
}

fn config() -> AssistantConfig {
    let mut config = AssistantConfig::offline();
    config.backend_timeout = Duration::from_millis(50);
    config.build_timeout = Duration::from_secs(2);
    config
}

fn assistant_with(
    backend: Option<Arc<dyn GenerationBackend>>,
    generator: Arc<dyn FileGenerator>,
) -> Assistant {
    Assistant::new(
        config(),
        Arc::new(InMemoryProjectRepository::new()),
        backend,
        generator,
    )
}

#[tokio::test]
async fn test_todo_app_offline() {
    let generator = Arc::new(CountingGenerator::default());
    let assistant = assistant_with(None, generator.clone());
    let id = assistant.start_conversation();

    let reply = assistant
        .assist(&id, AssistRequest::new("Build a todo app"))
        .await
        .unwrap();

    assert_eq!(reply.intent.intent_type, IntentType::CreateApp);
    assert_eq!(reply.source, ReplySource::Local);
    let plan_id = reply.plan_id.expect("creation requests carry a plan");

    let conversation = assistant.conversation(&id).unwrap();
    let pending = conversation.pending_plan().unwrap();
    assert_eq!(pending.plan_id, plan_id);
    assert_eq!(pending.plan.plan_type, "Productivity");
    assert!(pending.plan.features.len() >= 5);

    // nothing is generated before approval
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);

    let report = assistant.approve(&id, &plan_id).await.unwrap();
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    assert!(report.files[0].content.starts_with("TaskFlow Todo Manager"));

    // approval is single-use
    assert!(matches!(
        assistant.approve(&id, &plan_id).await,
        Err(ChatError::PlanNotPending {
            status: PlanStatus::Approved,
            ..
        })
    ));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_backend_plan_with_prose() {
    let backend = Arc::new(StaticBackend::new(
        "Great idea! ```json\n{\"name\": \"Petals & Co\", \"description\": \"Florist with same-day delivery\", \"type\": \"E-commerce\", \"features\": [\"Bouquet builder\"], \"technologies\": [\"Vue\"], \"preview\": {\"title\": \"Petals\", \"description\": \"Flowers\", \"sections\": [\"Hero\"]}}\n```",
    ));
    let assistant = assistant_with(
        Some(backend.clone()),
        Arc::new(CountingGenerator::default()),
    );
    let id = assistant.start_conversation();

    let reply = assistant
        .assist(&id, AssistRequest::new("Create a florist shop"))
        .await
        .unwrap();
    assert_eq!(reply.source, ReplySource::Backend);

    let conversation = assistant.conversation(&id).unwrap();
    let plan = &conversation.pending_plan().unwrap().plan;
    assert_eq!(plan.name, "Petals & Co");
    assert_eq!(plan.description, "Florist with same-day delivery");
    assert_eq!(plan.features, vec!["Bouquet builder"]);

    let seen = backend.seen.lock();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].user_prompt.starts_with("Create a florist shop"));
    assert!(seen[0].system_prompt.contains("- App type: e-commerce"));
}

#[tokio::test]
async fn test_failing_backend_falls_back() {
    let assistant = assistant_with(
        Some(Arc::new(FailingBackend)),
        Arc::new(CountingGenerator::default()),
    );
    let id = assistant.start_conversation();

    let reply = assistant
        .assist(&id, AssistRequest::new("sell candy online"))
        .await
        .unwrap();
    assert_eq!(reply.source, ReplySource::Local);
    let conversation = assistant.conversation(&id).unwrap();
    let plan = &conversation.pending_plan().unwrap().plan;
    assert!(plan.name.contains("Candy"));

    let reply = assistant
        .assist(&id, AssistRequest::new("my checkout is broken"))
        .await
        .unwrap();
    assert_eq!(reply.intent.intent_type, IntentType::Debug);
    assert!(reply.plan_id.is_none());
    assert!(reply.message.contains("couldn't reach the AI assistant"));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let assistant = assistant_with(
        Some(Arc::new(SlowBackend)),
        Arc::new(CountingGenerator::default()),
    );
    let id = assistant.start_conversation();

    let reply = assistant
        .assist(&id, AssistRequest::new("Build a blog"))
        .await
        .unwrap();
    assert_eq!(reply.source, ReplySource::Local);
    let conversation = assistant.conversation(&id).unwrap();
    assert_eq!(conversation.pending_plan().unwrap().plan.name, "Content Hub CMS");
}

#[tokio::test]
async fn test_new_message_supersedes_pending_plan() {
    let generator = Arc::new(CountingGenerator::default());
    let assistant = assistant_with(None, generator.clone());
    let id = assistant.start_conversation();

    let first = assistant
        .assist(&id, AssistRequest::new("Build a todo app"))
        .await
        .unwrap()
        .plan_id
        .unwrap();
    let second = assistant
        .assist(&id, AssistRequest::new("Actually, build a surf shop"))
        .await
        .unwrap()
        .plan_id
        .unwrap();
    assert_ne!(first, second);

    assert!(matches!(
        assistant.approve(&id, &first).await,
        Err(ChatError::PlanNotPending {
            status: PlanStatus::Superseded,
            ..
        })
    ));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);

    let conversation = assistant.conversation(&id).unwrap();
    let waiting = conversation
        .messages()
        .iter()
        .filter(|m| m.is_waiting_for_approval())
        .count();
    assert_eq!(waiting, 1);
}

#[tokio::test]
async fn test_build_failure_is_visible() {
    let assistant = assistant_with(None, Arc::new(BrokenGenerator));
    let id = assistant.start_conversation();
    let plan_id = assistant
        .assist(&id, AssistRequest::new("Build a todo app"))
        .await
        .unwrap()
        .plan_id
        .unwrap();

    let err = assistant.approve(&id, &plan_id).await.unwrap_err();
    assert!(err.to_string().contains("file generation failed"));

    let conversation = assistant.conversation(&id).unwrap();
    assert_eq!(conversation.plan(&plan_id).unwrap().status, PlanStatus::Approved);
    match conversation.last_message() {
        Some(ConversationMessage::BuildResult(m)) => {
            assert!(m.content.contains("disk quota exceeded"));
            assert!(!m.content.contains("couldn't reach"));
        }
        other => panic!("expected a build result, got {other:?}"),
    }
}

#[tokio::test]
async fn test_project_context_reaches_prompt() {
    let repository = Arc::new(InMemoryProjectRepository::new());
    let project = repository.create_project(NewProject::new("Shop Frontend"));
    repository
        .add_file(
            project.id,
            "package.json",
            r#"{"dependencies": {"react": "^18.2.0"}}"#,
        )
        .unwrap();
    repository
        .add_file(project.id, "src/cart.js", "function total() { console.error('x') }")
        .unwrap();

    let backend = Arc::new(StaticBackend::new("The cart logs an error on every call."));
    let assistant = Assistant::new(
        config(),
        repository,
        Some(backend.clone()),
        Arc::new(TemplateFileGenerator::new()),
    );
    let id = assistant.start_conversation();

    let reply = assistant
        .assist(
            &id,
            AssistRequest::new("Explain the cart code").with_project(project.id),
        )
        .await
        .unwrap();
    assert_eq!(reply.source, ReplySource::Backend);
    assert_eq!(reply.message, "The cart logs an error on every call.");

    let seen = backend.seen.lock();
    assert!(seen[0].system_prompt.contains("- Project: Shop Frontend"));
    assert!(seen[0].system_prompt.contains("- Dependencies: react"));
    assert!(seen[0].user_prompt.contains("File: src/cart.js"));
}

#[tokio::test]
async fn test_conversations_are_independent() {
    let assistant = Arc::new(assistant_with(None, Arc::new(CountingGenerator::default())));

    let mut handles = Vec::new();
    for message in ["Build a todo app", "sell candy online", "Build a blog", "surf shop"] {
        let assistant = assistant.clone();
        handles.push(tokio::spawn(async move {
            let id = assistant.start_conversation();
            let reply = assistant.assist(&id, AssistRequest::new(message)).await.unwrap();
            (id, reply.plan_id.unwrap())
        }));
    }

    for handle in handles {
        let (id, plan_id) = handle.await.unwrap();
        assert!(assistant.approve(&id, &plan_id).await.is_ok());
    }
    assert_eq!(assistant.conversation_count(), 4);
}
