//! Tests for the Catch-Up game session controller.

use std::collections::BTreeSet;
use strictly_catchup::{
    ConfirmOutcome, GameSession, InvariantSet, LocalRules, Mode, Move, MoveError, MoveValidator,
    Outcome, PlayerNames, Pool, Scores, ServiceError, ServiceErrorKind, SessionError,
    SessionInvariants, SessionPhase, StatusKind, Turn, ValidationRequest, Verdict, WinTally,
    greedy_move,
};

/// Accepts every move; numeric legality is not under test here.
struct AcceptAll;

#[async_trait::async_trait]
impl MoveValidator for AcceptAll {
    async fn validate(&self, _request: &ValidationRequest) -> Result<Verdict, ServiceError> {
        Ok(Verdict::accept())
    }
}

struct RejectAll;

#[async_trait::async_trait]
impl MoveValidator for RejectAll {
    async fn validate(&self, _request: &ValidationRequest) -> Result<Verdict, ServiceError> {
        Ok(Verdict::reject("Sum too small"))
    }
}

struct Offline;

#[async_trait::async_trait]
impl MoveValidator for Offline {
    async fn validate(&self, _request: &ValidationRequest) -> Result<Verdict, ServiceError> {
        Err(ServiceError::new(ServiceErrorKind::Transport, "connection refused"))
    }
}

fn started(mode: Mode, balls: u32) -> GameSession {
    let mut session = GameSession::new();
    session
        .start(mode, balls, PlayerNames::for_mode(mode, None, None))
        .expect("start failed");
    session
}

fn mv(numbers: &[u32]) -> Move {
    Move::new(numbers.iter().copied()).expect("valid move")
}

fn state(session: &GameSession) -> (Pool, Scores, Turn) {
    (session.pool().clone(), session.scores(), session.turn())
}

#[test]
fn test_start_initializes_session() {
    let session = started(Mode::HumanVsHuman, 10);
    assert_eq!(session.pool(), &Pool::with_count(10));
    assert_eq!(session.scores(), Scores::default());
    assert_eq!(session.turn(), Turn::P1);
    assert_eq!(session.phase(), SessionPhase::AwaitingMove(Turn::P1));
    assert_eq!(session.status().kind(), StatusKind::SessionStarted);
    assert_eq!(session.status().message(), "GAME STARTED");
    assert!(session.replay().is_empty());
    assert!(!session.can_undo());
}

#[test]
fn test_start_rejects_empty_pool() {
    let mut session = GameSession::new();
    let result = session.start(Mode::HumanVsHuman, 0, PlayerNames::default());
    assert_eq!(result, Err(SessionError::InvalidBallCount));
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert_eq!(session.status().message(), "PRESS START");
}

#[tokio::test]
async fn test_confirm_then_undo_scenario() {
    let mut session = started(Mode::HumanVsHuman, 10);
    let before = state(&session);

    let outcome = session.confirm_move(&AcceptAll, [3, 4]).await.unwrap();
    let ConfirmOutcome::Applied(record) = outcome else {
        panic!("move should be applied");
    };
    assert_eq!(*record.points(), 7);
    assert_eq!(*record.actor(), Turn::P1);
    assert_eq!(*record.replay_index(), 0);
    assert_eq!(session.scores(), Scores::new(7, 0));
    assert_eq!(session.pool(), &Pool::from_numbers([1, 2, 5, 6, 7, 8, 9, 10]));
    assert_eq!(session.turn(), Turn::P2);
    assert_eq!(session.status().message(), "PLAYER 2'S TURN");

    assert!(session.undo_move());
    assert_eq!(state(&session), before);
    assert_eq!(session.status().kind(), StatusKind::Undone);
    assert_eq!(session.phase(), SessionPhase::AwaitingMove(Turn::P1));
}

#[tokio::test]
async fn test_rejected_move_leaves_state_unchanged() {
    let mut session = started(Mode::HumanVsHuman, 10);
    let before = state(&session);

    let outcome = session.confirm_move(&RejectAll, [5]).await.unwrap();
    assert_eq!(
        outcome,
        ConfirmOutcome::Rejected {
            reason: "Sum too small".to_string()
        }
    );
    assert_eq!(state(&session), before);
    assert_eq!(session.status().kind(), StatusKind::MoveRejected);
    assert_eq!(session.status().message(), "INVALID MOVE: Sum too small");
    assert!(session.replay().is_empty());
}

#[tokio::test]
async fn test_unreachable_validator_surfaces_error() {
    let mut session = started(Mode::HumanVsHuman, 10);
    let before = state(&session);

    let outcome = session.confirm_move(&Offline, [5]).await.unwrap();
    assert!(matches!(outcome, ConfirmOutcome::Unavailable { .. }));
    assert_eq!(state(&session), before);
    assert_eq!(session.status().kind(), StatusKind::ServiceError);
    assert!(session.status().message().starts_with("API ERROR"));
}

#[tokio::test]
async fn test_local_errors_do_not_touch_status() {
    let mut session = started(Mode::HumanVsHuman, 5);
    let status = session.status().clone();

    assert_eq!(
        session.confirm_move(&AcceptAll, [9]).await,
        Err(SessionError::NotInPool(9))
    );
    assert_eq!(
        session.confirm_move(&AcceptAll, Vec::new()).await,
        Err(SessionError::Move(MoveError::Empty))
    );
    assert_eq!(session.status(), &status);
}

#[tokio::test]
async fn test_local_rules_reject_overshooting_opening() {
    let mut session = started(Mode::HumanVsHuman, 10);
    let outcome = session.confirm_move(&LocalRules::new(), [3, 4]).await.unwrap();
    assert!(matches!(outcome, ConfirmOutcome::Rejected { .. }));
    assert_eq!(session.pool(), &Pool::with_count(10));
}

#[tokio::test]
async fn test_selection_toggle_and_confirm() {
    let mut session = started(Mode::HumanVsHuman, 10);

    assert!(session.propose_selection(2));
    assert!(session.propose_selection(5));
    assert!(session.propose_selection(2));
    assert!(!session.propose_selection(11));
    assert_eq!(session.selection(), &BTreeSet::from([5]));

    let outcome = session.confirm_selection(&AcceptAll).await.unwrap();
    assert!(matches!(outcome, ConfirmOutcome::Applied(_)));
    assert!(session.selection().is_empty());
    assert!(!session.propose_selection(5));
}

#[tokio::test]
async fn test_bot_sides_refuse_local_input() {
    let mut session = started(Mode::BotVsBot, 6);
    assert!(!session.propose_selection(3));
    assert_eq!(
        session.confirm_move(&AcceptAll, [3]).await,
        Err(SessionError::NotLocalTurn(Turn::P1))
    );

    let mut session = started(Mode::HumanVsBot, 6);
    session.confirm_move(&AcceptAll, [6]).await.unwrap();
    assert!(!session.propose_selection(3));
    assert_eq!(session.bot_turn(), Some(Turn::P2));
}

#[test]
fn test_idle_session_refuses_selection() {
    let mut session = GameSession::new();
    assert!(!session.propose_selection(1));
    assert!(!session.undo_move());
    assert!(!session.redo_move());
}

#[tokio::test]
async fn test_human_vs_bot_undo_unwinds_both_moves() {
    let mut session = started(Mode::HumanVsBot, 10);
    let before_human = state(&session);

    session.confirm_move(&AcceptAll, [10]).await.unwrap();
    session.apply_move(&mv(&[9, 1])).unwrap();
    assert_eq!(session.turn(), Turn::P1);

    assert!(session.undo_move());
    assert_eq!(state(&session), before_human);
    assert_eq!(session.history().undo_len(), 0);
    assert_eq!(session.history().redo_len(), 1);
}

#[tokio::test]
async fn test_human_vs_bot_undo_on_bot_turn_returns_control_to_human() {
    let mut session = started(Mode::HumanVsBot, 10);
    session.confirm_move(&AcceptAll, [10]).await.unwrap();
    session.apply_move(&mv(&[9, 1])).unwrap();
    let before_second_human = state(&session);

    // The bot is now to move with an odd number of recorded moves.
    session.confirm_move(&AcceptAll, [8]).await.unwrap();
    assert_eq!(session.bot_turn(), Some(Turn::P2));
    assert!(session.can_undo());

    assert!(session.undo_move());
    assert_eq!(state(&session), before_second_human);
    assert_eq!(session.turn(), Turn::P1);
    assert_eq!(session.bot_turn(), None);
    assert_eq!(session.phase(), SessionPhase::AwaitingMove(Turn::P1));
    assert_eq!(session.history().undo_len(), 2);

    // A lone opening move is unwound the same way.
    let mut session = started(Mode::HumanVsBot, 10);
    let before_human = state(&session);
    session.confirm_move(&AcceptAll, [10]).await.unwrap();
    assert!(session.undo_move());
    assert_eq!(state(&session), before_human);
    assert!(!session.undo_move());
}

#[test]
fn test_undo_redo_round_trip() {
    let mut session = started(Mode::HumanVsHuman, 10);
    session.apply_move(&mv(&[10])).unwrap();
    session.apply_move(&mv(&[9, 1])).unwrap();
    let live = state(&session);

    assert!(session.undo_move());
    assert!(session.redo_move());
    assert_eq!(state(&session), live);
    assert_eq!(session.status().message(), "REDO");
    assert!(!session.redo_move());
}

#[test]
fn test_new_move_discards_redo_branch() {
    let mut session = started(Mode::HumanVsHuman, 10);
    session.apply_move(&mv(&[10])).unwrap();
    assert!(session.undo_move());
    assert!(session.can_redo());

    session.apply_move(&mv(&[8])).unwrap();
    assert!(!session.can_redo());
    assert!(!session.redo_move());
}

#[test]
fn test_undo_does_not_rewrite_replay() {
    let mut session = started(Mode::HumanVsHuman, 10);
    session.apply_move(&mv(&[10])).unwrap();
    session.apply_move(&mv(&[9, 1])).unwrap();
    assert!(session.undo_move());
    assert_eq!(session.replay().len(), 2);

    let record = session.apply_move(&mv(&[8, 2])).unwrap();
    assert_eq!(*record.replay_index(), 2);
}

#[test]
fn test_greedy_game_keeps_invariants() {
    for mode in [Mode::HumanVsHuman, Mode::BotVsBot] {
        let mut session = started(mode, 12);
        let mut last_scores = session.scores();

        while session.phase().is_running() {
            let turn = session.turn();
            let chosen = greedy_move(session.pool(), &session.scores(), turn).expect("pool not empty");
            session.apply_move(&chosen).unwrap();

            assert_eq!(session.turn(), turn.opponent());
            assert!(session.scores().p1 >= last_scores.p1);
            assert!(session.scores().p2 >= last_scores.p2);
            last_scores = session.scores();

            let mut seen: BTreeSet<u32> = session.pool().iter().collect();
            seen.extend(session.replay().claimed_numbers());
            assert_eq!(seen, (1..=12).collect::<BTreeSet<u32>>());
            assert!(SessionInvariants::check_all(&session).is_ok());
        }
        assert!(session.pool().is_empty());
        assert_eq!(session.scores().total(), 78);
    }
}

#[test]
fn test_game_over_credits_winner() {
    let mut session = GameSession::with_wins(WinTally { p1: 2, p2: 5 });
    session
        .start(Mode::HumanVsHuman, 4, PlayerNames::new("Ann", "Bo"))
        .unwrap();

    session.apply_move(&mv(&[4])).unwrap();
    session.apply_move(&mv(&[3, 1])).unwrap();
    let record = session.apply_move(&mv(&[2])).unwrap();

    assert_eq!(*record.outcome(), Some(Outcome::Winner(Turn::P1)));
    assert_eq!(session.phase(), SessionPhase::GameOver(Outcome::Winner(Turn::P1)));
    assert_eq!(session.status().message(), "ANN WINS!");
    assert_eq!(session.wins(), WinTally { p1: 3, p2: 5 });

    assert!(!session.undo_move());
    assert_eq!(session.apply_move(&mv(&[1])), Err(SessionError::NotRunning));
}

#[test]
fn test_draw_credits_nobody() {
    let mut session = started(Mode::HumanVsHuman, 3);
    session.apply_move(&mv(&[3])).unwrap();
    let record = session.apply_move(&mv(&[1, 2])).unwrap();

    assert_eq!(*record.outcome(), Some(Outcome::Draw));
    assert_eq!(session.status().message(), "DRAW");
    assert_eq!(session.wins(), WinTally::default());
}

#[test]
fn test_replay_preview_after_game() {
    let mut session = started(Mode::HumanVsHuman, 4);
    assert_eq!(
        session.preview_replay_step(0),
        Err(SessionError::ReplayWhileRunning)
    );

    session.apply_move(&mv(&[4])).unwrap();
    session.apply_move(&mv(&[3, 1])).unwrap();
    session.apply_move(&mv(&[2])).unwrap();
    let undo_len = session.history().undo_len();

    let first = session.preview_replay_step(1).unwrap();
    let first_state = (session.pool().clone(), session.scores());
    let second = session.preview_replay_step(1).unwrap();
    assert_eq!(first, second);
    assert_eq!((session.pool().clone(), session.scores()), first_state);
    assert_eq!(session.pool(), &Pool::from_numbers([2]));
    assert_eq!(session.scores(), Scores::new(4, 4));
    assert_eq!(session.replay_position(), Some(1));
    assert_eq!(session.status().message(), "REPLAY STEP 2");
    assert_eq!(session.history().undo_len(), undo_len);

    assert_eq!(
        session.preview_replay_step(3),
        Err(SessionError::ReplayIndexOutOfRange { index: 3, len: 3 })
    );
}

#[test]
fn test_reset_keeps_or_clears_as_asked() {
    let mut session = started(Mode::HumanVsHuman, 3);
    session.apply_move(&mv(&[3])).unwrap();
    session.apply_move(&mv(&[2])).unwrap();
    session.apply_move(&mv(&[1])).unwrap();
    assert_eq!(session.wins(), WinTally { p1: 1, p2: 0 });

    session.reset_session(true, false);
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert_eq!(session.status().kind(), StatusKind::Idle);
    assert_eq!(session.replay().len(), 3);
    assert_eq!(session.wins(), WinTally { p1: 1, p2: 0 });
    assert!(session.preview_replay_step(2).is_ok());

    session.reset_session(false, true);
    assert!(session.replay().is_empty());
    assert_eq!(session.wins(), WinTally::default());
}

#[test]
fn test_every_change_bumps_generation() {
    let mut session = started(Mode::HumanVsHuman, 10);
    let mut generation = session.generation();

    session.apply_move(&mv(&[10])).unwrap();
    assert!(session.generation() > generation);
    generation = session.generation();

    assert!(session.undo_move());
    assert!(session.generation() > generation);
    generation = session.generation();

    session.reset_session(true, false);
    assert!(session.generation() > generation);
}
