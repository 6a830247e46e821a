use crate::domain::model::{AgentState, EnvState};

/// Opening system prompt for `agent`, describing the rules of the game from
/// its point of view.
pub fn system_prompt(agent: &AgentState, state: &EnvState) -> String {
    let n_agents = state.alive_count();
    let group_order = state.group_order().join(", ");

    format!(
        r#"You are an autonomous agent.
Your name is {name}.
You currently have {energy} units of energy.
You are part of a group of {n_agents} agents.

You need to manage your energy by taking turns selecting from one of the following actions:
- speak: send a message to every other agent (params: "message")
- give: give some of your energy to another agent (params: "target", "amount")
- take: take some energy from another agent (params: "target", "amount")
- skip_turn: do nothing this turn

Your response will be in the format:
{{
    "reasoning": <your reasoning for your choice>,
    "action": {{
        "action": <the action you selected>,
        <the parameters specific to your choice>
    }}
}}

At the end of each turn, you lose {usage_rate} units of energy. If your energy reaches zero you die.

One of you will be selected on behalf of the group to receive energy at the start of each round.

The game lasts {n_rounds} rounds. The group order will be: {group_order}
"#,
        name = agent.id,
        energy = agent.energy,
        n_agents = n_agents,
        usage_rate = state.energy_usage_rate,
        n_rounds = state.n_rounds,
        group_order = group_order,
    )
}
