use crate::client::{ChatMessage, GenerationClient};
use crate::error::Result;
use crate::estimate::Estimate;
use crate::prompts;
use serde::Serialize;
use sprint_core::metrics::{CurrentSprintData, VelocityRecord, WorkflowData};
use sprint_core::retro::Retrospective;
use sprint_core::standup::MemberUpdate;
use sprint_core::story::Story;

/// Estimation wants repeatable numbers more than varied prose.
const ESTIMATION_TEMPERATURE: f32 = 0.3;

/// Assistant operations. Each sends one system prompt and one user message
/// carrying the domain data, and returns the cleaned reply.
#[derive(Debug, Clone)]
pub struct Assistant {
    client: GenerationClient,
}

impl Assistant {
    pub fn new(client: GenerationClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GenerationClient {
        &self.client
    }

    fn ask(&self, system: &str, user: String, temperature: Option<f32>) -> Result<String> {
        self.client.complete(
            &[ChatMessage::system(system), ChatMessage::user(user)],
            temperature,
        )
    }

    fn ask_with_data<T: Serialize + ?Sized>(
        &self,
        system: &str,
        label: &str,
        data: &T,
    ) -> Result<String> {
        let json = serde_json::to_string_pretty(data)?;
        self.ask(system, format!("{label}: {json}"), None)
    }

    pub fn estimate_story_points(
        &self,
        title: &str,
        description: &str,
        acceptance_criteria: &str,
    ) -> Result<Estimate> {
        let user = format!(
            "Story Title: {title}\nDescription: {description}\nAcceptance Criteria: {acceptance_criteria}\n\n\
             Please provide a detailed story point estimation with reasoning."
        );
        let reply = self.ask(prompts::STORY_ESTIMATION, user, Some(ESTIMATION_TEMPERATURE))?;
        Ok(Estimate::from_reply(reply))
    }

    pub fn standup_summary(&self, updates: &[MemberUpdate]) -> Result<String> {
        self.ask(
            prompts::STANDUP_SUMMARY,
            format!("Team Updates:\n{}", format_updates(updates)),
            None,
        )
    }

    pub fn sprint_health(&self, sprint: &CurrentSprintData) -> Result<String> {
        self.ask_with_data(prompts::SPRINT_ANALYSIS, "Sprint Data", sprint)
    }

    pub fn retrospective_insights(&self, retro: &Retrospective) -> Result<String> {
        self.ask_with_data(prompts::RETROSPECTIVE, "Retrospective Data", retro)
    }

    pub fn predict_velocity(&self, history: &[VelocityRecord]) -> Result<String> {
        self.ask_with_data(prompts::VELOCITY_PREDICTION, "Historical Velocity Data", history)
    }

    pub fn detect_bottlenecks(&self, workflow: &WorkflowData) -> Result<String> {
        self.ask_with_data(prompts::BOTTLENECK_DETECTION, "Workflow Data", workflow)
    }

    pub fn sprint_plan(&self, backlog: &[Story], capacity: u32) -> Result<String> {
        let json = serde_json::to_string_pretty(backlog)?;
        let user = format!(
            "Backlog Items: {json}\nTeam Capacity: {capacity} story points\n\n\
             Please create an optimal sprint plan."
        );
        self.ask(prompts::SPRINT_PLANNING, user, None)
    }
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

/// One block per member, blank fields replaced with placeholders.
pub fn format_updates(updates: &[MemberUpdate]) -> String {
    updates
        .iter()
        .map(|u| {
            format!(
                "Team Member: {}\nYesterday: {}\nToday: {}\nBlockers: {}\n",
                or_placeholder(&u.member, "Unknown"),
                or_placeholder(&u.yesterday, "No updates"),
                or_placeholder(&u.today, "No plans"),
                or_placeholder(&u.blockers, "None"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
