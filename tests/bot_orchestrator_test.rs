//! Tests for bot turn orchestration and the game driver loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use strictly_catchup::{
    BotEvent, BotOrchestrator, BotOutcome, BotPhase, BotSettings, Command, GameDriver, GameEvent,
    GameSession, GreedyBot, LocalRules, MemoryTallyStore, Mode, Move, MoveRequest, MoveService,
    MoveValidator, Outcome, PlayerNames, ServiceError, ServiceErrorKind, SessionPhase, StatusKind,
    TallyStore, Turn, ValidationRequest, Verdict,
};
use tokio::sync::mpsc;

struct AcceptAll;

#[async_trait::async_trait]
impl MoveValidator for AcceptAll {
    async fn validate(&self, _request: &ValidationRequest) -> Result<Verdict, ServiceError> {
        Ok(Verdict::accept())
    }
}

/// Greedy bot that counts how often it was asked.
#[derive(Default)]
struct CountingBot {
    calls: AtomicU32,
    inner: GreedyBot,
}

#[async_trait::async_trait]
impl MoveService for CountingBot {
    async fn request_move(&self, request: &MoveRequest) -> Result<Move, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.request_move(request).await
    }

    fn name(&self) -> &str {
        "counting"
    }
}

struct BrokenBot;

#[async_trait::async_trait]
impl MoveService for BrokenBot {
    async fn request_move(&self, _request: &MoveRequest) -> Result<Move, ServiceError> {
        Err(ServiceError::new(ServiceErrorKind::Status, "HTTP 500 from ai-move"))
    }

    fn name(&self) -> &str {
        "broken"
    }
}

/// Proposes a number that is never in a small pool.
struct CheatingBot;

#[async_trait::async_trait]
impl MoveService for CheatingBot {
    async fn request_move(&self, _request: &MoveRequest) -> Result<Move, ServiceError> {
        Ok(Move::new([99]).unwrap())
    }

    fn name(&self) -> &str {
        "cheating"
    }
}

fn started(mode: Mode, balls: u32) -> GameSession {
    let mut session = GameSession::new();
    session
        .start(mode, balls, PlayerNames::for_mode(mode, None, None))
        .expect("start failed");
    session
}

fn orchestrator(
    service: Arc<dyn MoveService>,
    retries: u32,
) -> (BotOrchestrator, mpsc::UnboundedReceiver<BotEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let settings = BotSettings::instant(4).with_service_policy(Duration::from_secs(2), retries);
    (BotOrchestrator::new(service, settings, tx), rx)
}

async fn next(rx: &mut mpsc::UnboundedReceiver<BotEvent>) -> BotEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("bot event timed out")
        .expect("bot channel closed")
}

#[tokio::test]
async fn test_bot_turn_previews_then_commits_once() {
    let service = Arc::new(CountingBot::default());
    let (mut bot, mut rx) = orchestrator(service.clone(), 0);
    let mut session = started(Mode::HumanVsBot, 10);

    assert!(!bot.activate(&mut session), "human moves first");
    session.confirm_move(&AcceptAll, [10]).await.unwrap();

    assert!(bot.activate(&mut session));
    assert_eq!(session.phase(), SessionPhase::BotThinking(Turn::P2));
    assert_eq!(session.status().message(), "BOT (LEVEL 4) THINKING...");
    assert!(!bot.activate(&mut session), "single flight per turn");

    let outcome = bot.handle(&mut session, next(&mut rx).await);
    let BotOutcome::Previewing(proposal) = outcome else {
        panic!("expected a preview, got {:?}", outcome);
    };
    assert_eq!(session.bot_preview(), Some(&proposal));
    assert_eq!(session.turn(), Turn::P2, "preview does not commit");

    let outcome = bot.handle(&mut session, next(&mut rx).await);
    let BotOutcome::Committed(record) = outcome else {
        panic!("expected a commit, got {:?}", outcome);
    };
    assert_eq!(record.claimed(), &proposal);
    assert_eq!(session.bot_preview(), None);
    assert_eq!(session.turn(), Turn::P1);
    assert_eq!(session.replay().len(), 2);
    assert_eq!(bot.phase(), &BotPhase::Idle);
    assert_eq!(service.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_service_failure_stalls_without_advancing() {
    let (mut bot, mut rx) = orchestrator(Arc::new(BrokenBot), 1);
    let mut session = started(Mode::HumanVsBot, 10);
    session.confirm_move(&AcceptAll, [10]).await.unwrap();
    let pool = session.pool().clone();
    let scores = session.scores();

    assert!(bot.activate(&mut session));
    let outcome = bot.handle(&mut session, next(&mut rx).await);
    assert!(matches!(outcome, BotOutcome::Failed(_)));

    assert_eq!(session.status().kind(), StatusKind::ServiceError);
    assert_eq!(session.phase(), SessionPhase::AwaitingMove(Turn::P2));
    assert_eq!(session.turn(), Turn::P2);
    assert_eq!(session.pool(), &pool);
    assert_eq!(session.scores(), scores);
    assert!(matches!(bot.phase(), BotPhase::Stalled { .. }));

    assert!(!bot.activate(&mut session), "no automatic retry after failure");

    session
        .start(Mode::HumanVsBot, 10, PlayerNames::default())
        .unwrap();
    assert!(!bot.activate(&mut session));
    assert_eq!(bot.phase(), &BotPhase::Idle);
}

#[tokio::test]
async fn test_move_outside_pool_is_a_failure() {
    let (mut bot, mut rx) = orchestrator(Arc::new(CheatingBot), 0);
    let mut session = started(Mode::BotVsBot, 5);

    assert!(bot.activate(&mut session));
    let outcome = bot.handle(&mut session, next(&mut rx).await);
    assert!(matches!(outcome, BotOutcome::Failed(_)));
    assert_eq!(session.pool().len(), 5);
    assert!(session.replay().is_empty());
}

#[tokio::test]
async fn test_late_response_after_restart_is_discarded() {
    let (mut bot, mut rx) = orchestrator(Arc::new(GreedyBot::default()), 0);
    let mut session = started(Mode::BotVsBot, 10);

    assert!(bot.activate(&mut session));
    session
        .start(Mode::BotVsBot, 6, PlayerNames::default())
        .unwrap();

    let outcome = bot.handle(&mut session, next(&mut rx).await);
    assert_eq!(outcome, BotOutcome::Discarded);
    assert_eq!(session.pool().len(), 6);
    assert!(session.replay().is_empty());
    assert_eq!(session.bot_preview(), None);

    assert!(bot.activate(&mut session), "new generation gets a new request");
}

#[tokio::test]
async fn test_undo_while_previewing_drops_the_preview() {
    let (mut bot, mut rx) = orchestrator(Arc::new(GreedyBot::default()), 0);
    let mut session = started(Mode::BotVsBot, 10);

    assert!(bot.activate(&mut session));
    bot.handle(&mut session, next(&mut rx).await);
    assert!(matches!(
        bot.handle(&mut session, next(&mut rx).await),
        BotOutcome::Committed(_)
    ));

    assert!(bot.activate(&mut session));
    assert!(matches!(
        bot.handle(&mut session, next(&mut rx).await),
        BotOutcome::Previewing(_)
    ));

    assert!(session.undo_move());
    assert_eq!(session.bot_preview(), None);
    assert_eq!(session.turn(), Turn::P1);

    assert_eq!(bot.handle(&mut session, next(&mut rx).await), BotOutcome::Discarded);
    assert_eq!(session.pool().len(), 10);
}

#[tokio::test]
async fn test_driver_plays_bot_vs_bot_to_completion() {
    let store = Arc::new(MemoryTallyStore::new());
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut driver = GameDriver::new(
        Arc::new(LocalRules::new()),
        Arc::new(GreedyBot::default()),
        BotSettings::instant(4),
        store.clone(),
        "catchup_wins",
        event_tx,
    );

    driver
        .execute(Command::Start {
            mode: Mode::BotVsBot,
            ball_count: 10,
            names: PlayerNames::for_mode(Mode::BotVsBot, None, None),
        })
        .await
        .unwrap();

    let finished = tokio::time::timeout(Duration::from_secs(10), async {
        while driver.session().phase().is_running() {
            let event = driver.next_bot_event().await.expect("bot channel closed");
            driver.handle_bot_event(event);
        }
    })
    .await;
    assert!(finished.is_ok(), "bot game did not finish");

    let session = driver.session();
    assert!(session.pool().is_empty());
    assert_eq!(session.scores().total(), 55);

    let mut events = Vec::new();
    while let Ok(event) = event_rx.try_recv() {
        events.push(event);
    }
    let commits = events
        .iter()
        .filter(|e| matches!(e, GameEvent::MoveCommitted(_)))
        .count();
    assert_eq!(commits, session.replay().len());

    let outcome = events.iter().find_map(|e| match e {
        GameEvent::GameOver { outcome, .. } => Some(*outcome),
        _ => None,
    });
    assert!(outcome.is_some());

    let stored = store.load("catchup_wins").unwrap();
    assert_eq!(stored, session.wins());
    if let Some(Outcome::Winner(_)) = outcome {
        assert!(events.iter().any(|e| matches!(e, GameEvent::TallyChanged(_))));
    }
}

#[tokio::test]
async fn test_driver_reports_refused_commands() {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut driver = GameDriver::new(
        Arc::new(AcceptAll),
        Arc::new(GreedyBot::default()),
        BotSettings::instant(4),
        Arc::new(MemoryTallyStore::new()),
        "catchup_wins",
        event_tx,
    );

    assert!(driver.execute(Command::Select(3)).await.is_err());
    assert!(matches!(event_rx.try_recv(), Ok(GameEvent::Ignored(_))));
    assert_eq!(driver.session().status().message(), "PRESS START");
}
