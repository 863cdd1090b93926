//! Hand-written fakes shared by the unit tests.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    bot::{default_bots, BotDeps, Handler, MultiBot},
    config::Config,
    dispatch::Dispatcher,
    domain::{ChatId, MessageId, MessageRef, StateId, UserId},
    error_sink::{self, ErrorReporter, ErrorSink},
    errors::Error,
    i18n::Catalog,
    messaging::{
        port::MessagingPort,
        types::{InlineKeyboard, MessagingCapabilities},
    },
    model::{Chat, ConversationState, OutgoingAction, Payload, ResponseDirective, Update, User},
    store::{ChatStateService, ChatStateStore, MemoryStore, TokenService, UserStore},
    Result,
};

pub fn test_config() -> Config {
    Config {
        telegram_bot_token: "test-token".to_string(),
        bot_name: "splitty_bot".to_string(),
        max_concurrent_handlers: 4,
        max_redirects: 3,
        default_lang: "en".to_string(),
        default_page_size: 5,
        consume_tokens: true,
    }
}

fn test_user(user_id: i64) -> User {
    User::new(UserId(user_id), "Test User")
}

/// Text message in the user's private chat.
pub fn text_update(user_id: i64, text: &str) -> Update {
    Update::new(
        test_user(user_id),
        Chat::private(ChatId(user_id)),
        Payload::text(MessageId(1), text),
    )
}

pub fn group_text_update(user_id: i64, text: &str) -> Update {
    Update::new(
        test_user(user_id),
        Chat::group(ChatId(-100)),
        Payload::text(MessageId(1), text),
    )
}

/// Button press in the user's private chat; callback id is `cb-<user_id>`.
pub fn callback_update(user_id: i64, data: &str) -> Update {
    let message = MessageRef {
        chat_id: ChatId(user_id),
        message_id: MessageId(10),
    };
    Update::new(
        test_user(user_id),
        Chat::private(ChatId(user_id)),
        Payload::callback(format!("cb-{user_id}"), data, Some(message)),
    )
}

/// Memory-backed dependencies plus the error sink they report into.
pub struct TestEnv {
    pub deps: BotDeps,
    pub store: Arc<MemoryStore>,
    pub errors: ErrorReporter,
    sink: Mutex<Option<ErrorSink>>,
}

impl TestEnv {
    pub fn new() -> Self {
        let cfg = Arc::new(test_config());
        let (errors, sink) = error_sink::channel();
        let store = Arc::new(MemoryStore::new(cfg.default_page_size));
        let deps = BotDeps {
            states: ChatStateService::new(store.clone(), errors.clone()),
            tokens: TokenService::new(store.clone(), cfg.consume_tokens),
            users: store.clone(),
            rooms: store.clone(),
            i18n: Arc::new(Catalog),
            cfg,
        };
        Self {
            deps,
            store,
            errors,
            sink: Mutex::new(Some(sink)),
        }
    }

    pub fn dispatcher(&self) -> Dispatcher {
        let bots = MultiBot::new(
            default_bots(&self.deps),
            self.deps.cfg.max_concurrent_handlers,
            self.errors.clone(),
        );
        Dispatcher::new(bots, self.deps.states.clone(), self.errors.clone())
    }

    pub async fn register_user(&self, user_id: i64) -> User {
        UserStore::upsert(self.store.as_ref(), &test_user(user_id))
            .await
            .unwrap()
    }

    /// The keyboard of the only action in `resp`.
    pub fn only_keyboard<'a>(&self, resp: &'a ResponseDirective) -> &'a InlineKeyboard {
        match &resp.actions[..] {
            [OutgoingAction::SendText {
                keyboard: Some(k), ..
            }]
            | [OutgoingAction::EditText {
                keyboard: Some(k), ..
            }] => k,
            other => panic!("expected one action with a keyboard, got {other:?}"),
        }
    }

    /// Stop the sink and return how many reports it logged.
    pub async fn drain(&self) -> usize {
        let sink = self.sink.lock().unwrap().take().expect("sink already drained");
        let cancel = CancellationToken::new();
        cancel.cancel();
        sink.run(cancel).await
    }
}

/// Records every transport call as `"<op>:<text or id>"`.
#[derive(Default)]
pub struct FakeMessenger {
    calls: Mutex<Vec<String>>,
    fail_on: Option<String>,
    no_edit: bool,
}

impl FakeMessenger {
    /// `send_html` with exactly this text fails and is not recorded.
    pub fn failing_on(text: &str) -> Self {
        Self {
            fail_on: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn without_edit() -> Self {
        Self {
            no_edit: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_html: true,
            supports_edit: !self.no_edit,
            supports_inline_keyboards: true,
            max_message_len: 4096,
        }
    }

    async fn send_html(
        &self,
        chat_id: ChatId,
        html: &str,
        _keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageRef> {
        if self.fail_on.as_deref() == Some(html) {
            return Err(Error::External(format!("send failed: {html}")));
        }
        self.record(format!("send:{html}"));
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(100),
        })
    }

    async fn edit_html(
        &self,
        _msg: MessageRef,
        html: &str,
        _keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        self.record(format!("edit:{html}"));
        Ok(())
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.record(format!("delete:{}", msg.message_id.0));
        Ok(())
    }

    async fn answer_callback_query(&self, callback_id: &str, _text: Option<&str>) -> Result<()> {
        self.record(format!("answer:{callback_id}"));
        Ok(())
    }
}

/// Chat state store whose every operation fails.
pub struct FailingStateStore;

#[async_trait]
impl ChatStateStore for FailingStateStore {
    async fn save(&self, _state: &ConversationState) -> Result<()> {
        Err(Error::Storage("state store down".to_string()))
    }

    async fn delete_by_id(&self, _id: StateId) -> Result<()> {
        Err(Error::Storage("state store down".to_string()))
    }

    async fn delete_by_user(&self, _user_id: UserId) -> Result<()> {
        Err(Error::Storage("state store down".to_string()))
    }

    async fn find_by_user(&self, _user_id: UserId) -> Result<Option<ConversationState>> {
        Err(Error::Storage("state store down".to_string()))
    }
}

/// Tracks how many scripted handlers are inside `on_message` at once.
#[derive(Default)]
pub struct Gauge {
    current: AtomicUsize,
    max: AtomicUsize,
}

impl Gauge {
    pub fn max(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }

    fn enter(self: &Arc<Self>) -> GaugeGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
        GaugeGuard(self.clone())
    }
}

struct GaugeGuard(Arc<Gauge>);

impl Drop for GaugeGuard {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

enum Script {
    Succeed { actions: usize },
    Fail,
    Panic,
}

/// Handler with canned behaviour for composite tests.
pub struct ScriptedHandler {
    name: &'static str,
    script: Script,
    reacting: bool,
    sending: bool,
    delay: Option<Duration>,
    gauge: Option<Arc<Gauge>>,
    calls: AtomicUsize,
}

impl ScriptedHandler {
    fn new(name: &'static str, script: Script) -> Self {
        Self {
            name,
            script,
            reacting: true,
            sending: true,
            delay: None,
            gauge: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Succeeds with `actions` text messages.
    pub fn ok(name: &'static str, actions: usize) -> Self {
        Self::new(name, Script::Succeed { actions })
    }

    /// Fails with `External("<name> failed")`.
    pub fn failing(name: &'static str) -> Self {
        Self::new(name, Script::Fail)
    }

    pub fn panicking(name: &'static str) -> Self {
        Self::new(name, Script::Panic)
    }

    pub fn reacting(mut self, reacting: bool) -> Self {
        self.reacting = reacting;
        self
    }

    pub fn sending(mut self, sending: bool) -> Self {
        self.sending = sending;
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn gauged(mut self, gauge: Arc<Gauge>) -> Self {
        self.gauge = Some(gauge);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Handler for ScriptedHandler {
    fn name(&self) -> &'static str {
        self.name
    }

    fn has_react(&self, _update: &Update) -> bool {
        self.reacting
    }

    async fn on_message(
        &self,
        _cancel: &CancellationToken,
        update: &Update,
    ) -> Result<ResponseDirective> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _inside = self.gauge.as_ref().map(Gauge::enter);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.script {
            Script::Succeed { actions } => Ok(ResponseDirective {
                actions: (0..actions)
                    .map(|i| OutgoingAction::SendText {
                        chat_id: update.chat.id,
                        text: format!("{}-{i}", self.name),
                        keyboard: None,
                    })
                    .collect(),
                send: self.sending,
                ..ResponseDirective::default()
            }),
            Script::Fail => Err(Error::External(format!("{} failed", self.name))),
            Script::Panic => panic!("{} panicked", self.name),
        }
    }
}
