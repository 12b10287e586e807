use duel_app::controller::{DuelController, PolicyKind};
use duel_app::rl::{QAgent, shared};
use duel_core::model::round::{EndReason, RoundError};
use duel_core::model::side::Side;

#[test]
fn human_against_learning_agent_reaches_a_result() {
    let agent = shared(QAgent::default());
    let mut controller = DuelController::new_with_seed(agent, Some(31));
    let mut round = controller.start_round().unwrap();

    // The human always stands; the agent answers through `decide`.
    while let Some(side) = round.current_side() {
        let action = match side {
            Side::A => duel_core::model::action::Action::Stand,
            Side::B => controller.decide(PolicyKind::Learning, &round, Side::B),
        };
        controller.apply_action(&mut round, side, action).unwrap();
    }

    let result = round.result().unwrap();
    assert!(matches!(
        result.reason,
        EndReason::BothStood | EndReason::Bust(Side::B) | EndReason::TurnCap
    ));
    assert!(round.conserves_master_deck());
    assert_eq!(
        controller.apply_action(&mut round, Side::A, duel_core::model::action::Action::Hit),
        Err(RoundError::RoundOver)
    );
}

#[test]
fn shared_agent_is_visible_to_both_holders() {
    let agent = shared(QAgent::default());
    let mut controller = DuelController::new_with_seed(agent.clone(), Some(32));
    controller
        .run_training(duel_app::training::TrainingMode::VsHeuristic, 50)
        .unwrap();
    assert!(!agent.read().table().is_empty());
    assert_eq!(
        agent.read().table().len(),
        controller.agent().read().table().len()
    );
}
