use std::sync::Arc;

use chrono::Utc;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use routebook_core::{
    fixtures, groups::search_queues, parse_criteria, Error, KeyValueStore, PlaybookTab, Policy,
    PolicyFilter, PolicyRepository, PolicyStatus, PolicyType, ProfileWithQueues, Queue,
    SelectionMode, UserGroup, UserGroupRepository, UserRecord,
};
use routebook_suggest::{
    catalog, copilot, detect_scenario, AssignmentTemplate, CopilotPolicy, PolicyTemplate,
    RingExpansionTemplate, ValidationIssue,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

// --- Request types ---

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SearchRequest {
    /// Case-insensitive text matched against name and description. Omit to list everything.
    #[serde(default)]
    query: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct IdRequest {
    /// Record id (e.g. "ug-sample-1", "sample-2")
    id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
struct SaveUserGroupRequest {
    /// Existing group id to overwrite. Omit to create a new group.
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    description: String,
    /// Free-text criteria, e.g. "Users with Spanish language, Skills Billing". See get_criteria_rules.
    eligibility_criteria: String,
    /// Queue ids this group serves (see list_queues)
    #[serde(default)]
    associated_queue_ids: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct PreviewRequest {
    /// Free-text eligibility criteria to evaluate against the agent roster
    criteria: String,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ListPoliciesRequest {
    /// "Orchestrator" or "Assignment". Omit for both.
    #[serde(default, rename = "type")]
    policy_type: Option<PolicyType>,
    /// Case-insensitive text matched against the policy name and trigger id
    #[serde(default)]
    query: Option<String>,
    /// Only policies that run for this engagement profile id (see get_catalog)
    #[serde(default)]
    profile_id: Option<String>,
    /// "overflow", "automatedMessages", "dynamicPrioritization" or "assignmentMethod"
    #[serde(default)]
    tab: Option<PlaybookTab>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
struct SavePolicyRequest {
    /// Existing policy id to overwrite. Omit to create a new policy.
    #[serde(default)]
    id: Option<String>,
    name: String,
    /// Behavior text, usually produced by one of the render_* tools
    behavior: String,
    /// Engagement profile ids (see get_catalog). Ignored when selectionMode is "all".
    #[serde(default)]
    profile_ids: Vec<String>,
    /// "all" (default), "list" or "except"
    #[serde(default)]
    selection_mode: SelectionMode,
    /// Trigger event id; defaults to "conversation-waiting"
    #[serde(default)]
    trigger: Option<String>,
    /// "Draft" (default) or "Published"
    #[serde(default)]
    status: PolicyStatus,
    /// "Orchestrator" (default) or "Assignment"
    #[serde(default, rename = "type")]
    policy_type: PolicyType,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
struct RenderAssignmentRequest {
    template: AssignmentTemplate,
    /// Save the rendered text as a new draft Assignment policy with this name
    #[serde(default)]
    save_as: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
struct RenderRingRequest {
    template: RingExpansionTemplate,
    /// Save the rendered text as a new draft Assignment policy with this name
    #[serde(default)]
    save_as: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
struct RenderCopilotRequest {
    policy: CopilotPolicy,
    /// Save the rendered text as a new draft Assignment policy with this name
    #[serde(default)]
    save_as: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct DetectScenarioRequest {
    /// What the user asked for, e.g. "Gold tier customers should go to their preferred expert"
    message: String,
}

// --- Response shapes ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserSummary<'a> {
    id: &'a str,
    name: &'a str,
}

impl<'a> From<&'a UserRecord> for UserSummary<'a> {
    fn from(u: &'a UserRecord) -> Self {
        Self { id: &u.id, name: &u.name }
    }
}

// --- Server ---

#[derive(Clone)]
pub struct RoutebookServer {
    policies: Arc<PolicyRepository>,
    groups: Arc<UserGroupRepository>,
    users: Arc<Vec<UserRecord>>,
    queues: Arc<Vec<Queue>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl RoutebookServer {
    pub fn new(store: Arc<dyn KeyValueStore>, seed_samples: bool) -> Self {
        Self {
            policies: Arc::new(PolicyRepository::new(store.clone()).with_samples(seed_samples)),
            groups: Arc::new(UserGroupRepository::new(store).with_samples(seed_samples)),
            users: Arc::new(fixtures::users()),
            queues: Arc::new(fixtures::queues()),
            tool_router: Self::tool_router(),
        }
    }

    // --- User groups ---

    #[tool(
        description = "List user groups, most recently updated first. Each entry has id, name, description, eligibilityCriteria, queueCount, eligibleCount and updated (relative time)."
    )]
    fn list_user_groups(
        &self,
        Parameters(req): Parameters<SearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        let groups = match self.groups.search(req.query.as_deref().unwrap_or("")) {
            Ok(g) => g,
            Err(e) => return Ok(tool_error(e)),
        };
        let now = Utc::now();
        let rows: Vec<serde_json::Value> = groups
            .iter()
            .map(|g| {
                json!({
                    "id": g.id,
                    "name": g.name,
                    "description": g.description,
                    "eligibilityCriteria": g.eligibility_criteria,
                    "queueCount": g.associated_queues(&self.queues).len(),
                    "eligibleCount": g.eligible_users(&self.users).len(),
                    "updated": routebook_core::time_ago(g.last_updated, now),
                })
            })
            .collect();
        json_result(&rows)
    }

    #[tool(
        description = "Get one user group with its resolved queues (unknown queue ids are skipped), parsed criteria and eligible users."
    )]
    fn get_user_group(
        &self,
        Parameters(req): Parameters<IdRequest>,
    ) -> Result<CallToolResult, McpError> {
        match self.groups.require(&req.id) {
            Ok(group) => json_result(&self.group_detail(&group)),
            Err(e) => Ok(tool_error(e)),
        }
    }

    #[tool(
        description = "Create or overwrite a user group. Name and eligibilityCriteria must not be blank. A new group gets a generated id. Preview criteria with preview_eligible_users first."
    )]
    fn save_user_group(
        &self,
        Parameters(req): Parameters<SaveUserGroupRequest>,
    ) -> Result<CallToolResult, McpError> {
        let unknown: Vec<&str> = req
            .associated_queue_ids
            .iter()
            .filter(|id| !self.queues.iter().any(|q| &q.id == *id))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Ok(tool_error(format!("Unknown queue id(s): {}", unknown.join(", "))));
        }

        let group = UserGroup {
            id: req.id.unwrap_or_default(),
            name: req.name,
            description: req.description,
            eligibility_criteria: req.eligibility_criteria,
            associated_queue_ids: req.associated_queue_ids,
            last_updated: Utc::now(),
        };
        match self.groups.save(group) {
            Ok(saved) => json_result(&self.group_detail(&saved)),
            Err(e) => Ok(tool_error(e)),
        }
    }

    #[tool(description = "Delete a user group by id")]
    fn delete_user_group(
        &self,
        Parameters(req): Parameters<IdRequest>,
    ) -> Result<CallToolResult, McpError> {
        match self.groups.delete(&req.id) {
            Ok(true) => Ok(text_result(format!("Deleted user group '{}'", req.id))),
            Ok(false) => Ok(tool_error(Error::not_found("user group", req.id))),
            Err(e) => Ok(tool_error(e)),
        }
    }

    #[tool(
        description = "Parse free-text eligibility criteria and list the agents it admits. Returns the parsed clauses (attribute, values, excluded), whether any filter applied, and the matching users. Text naming no known value admits everyone."
    )]
    fn preview_eligible_users(
        &self,
        Parameters(req): Parameters<PreviewRequest>,
    ) -> Result<CallToolResult, McpError> {
        let parsed = parse_criteria(&req.criteria);
        let eligible = routebook_core::filter_users(&self.users, &parsed);
        let users: Vec<UserSummary> = eligible.iter().map(|u| UserSummary::from(*u)).collect();
        json_result(&json!({
            "clauses": parsed.clauses,
            "filtered": !parsed.is_empty(),
            "eligibleCount": users.len(),
            "total": self.users.len(),
            "users": users,
        }))
    }

    #[tool(description = "Get the rules for writing eligibility criteria")]
    fn get_criteria_rules(&self) -> Result<CallToolResult, McpError> {
        Ok(text_result(routebook_core::rules::CRITERIA_RULES))
    }

    #[tool(description = "List queues (id, name, type, description), optionally filtered by name or description")]
    fn list_queues(
        &self,
        Parameters(req): Parameters<SearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        let queues = search_queues(&self.queues, req.query.as_deref().unwrap_or(""));
        json_result(&queues)
    }

    // --- Policies ---

    #[tool(
        description = "List saved routing policies, newest first. Filter by type, a search over name and trigger, an engagement profile the policy runs for, and/or tab. Each entry has id, name, status, type, trigger, profiles (display text), tab (playbook category), isNew and lastModified."
    )]
    fn list_policies(
        &self,
        Parameters(req): Parameters<ListPoliciesRequest>,
    ) -> Result<CallToolResult, McpError> {
        if let Some(id) = &req.profile_id {
            if !fixtures::engagement_profiles().iter().any(|p| &p.id == id) {
                return Ok(tool_error(format!("Unknown engagement profile '{}'", id)));
            }
        }
        let policies = match self.policies.list() {
            Ok(p) => p,
            Err(e) => return Ok(tool_error(e)),
        };
        let filter = PolicyFilter {
            policy_type: req.policy_type,
            query: req.query.unwrap_or_default(),
            profile_id: req.profile_id,
            tab: req.tab,
        };
        let now = Utc::now();
        let rows: Vec<serde_json::Value> = filter
            .apply(&policies)
            .into_iter()
            .map(|p| {
                json!({
                    "id": p.id,
                    "name": p.prompt_name,
                    "status": p.status,
                    "type": p.policy_type,
                    "trigger": p.selected_trigger,
                    "profiles": p.profile_display_text(),
                    "tab": p.playbook_tab(),
                    "isNew": p.is_new(now),
                    "lastModified": p.last_modified,
                })
            })
            .collect();
        json_result(&rows)
    }

    #[tool(description = "Get the full JSON of one policy")]
    fn get_policy(&self, Parameters(req): Parameters<IdRequest>) -> Result<CallToolResult, McpError> {
        match self.policies.require(&req.id) {
            Ok(policy) => json_result(&policy),
            Err(e) => Ok(tool_error(e)),
        }
    }

    #[tool(
        description = "Create or overwrite a policy. Keeps the original creation time when overwriting. Profiles are engagement profile ids from get_catalog; their queues are filled in."
    )]
    fn save_policy(
        &self,
        Parameters(req): Parameters<SavePolicyRequest>,
    ) -> Result<CallToolResult, McpError> {
        let trigger = req
            .trigger
            .unwrap_or_else(|| "conversation-waiting".to_string());
        if !fixtures::trigger_events().iter().any(|t| t.id == trigger) {
            return Ok(tool_error(format!("Unknown trigger '{}'", trigger)));
        }
        let selected_profiles = match resolve_profiles(&req.profile_ids) {
            Ok(p) => p,
            Err(e) => return Ok(tool_error(e)),
        };

        let id = req
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(new_policy_id);
        let policy = Policy {
            id: id.clone(),
            prompt_name: req.name,
            policy_behavior: req.behavior,
            selected_profiles,
            selection_mode: req.selection_mode,
            selected_trigger: trigger,
            status: req.status,
            last_modified: String::new(),
            policy_type: req.policy_type,
            created_at: None,
        };
        match self.policies.save(&id, policy) {
            Ok(saved) => json_result(&saved),
            Err(e) => Ok(tool_error(e)),
        }
    }

    #[tool(description = "Delete a policy by id")]
    fn delete_policy(
        &self,
        Parameters(req): Parameters<IdRequest>,
    ) -> Result<CallToolResult, McpError> {
        match self.policies.delete(&req.id) {
            Ok(true) => Ok(text_result(format!("Deleted policy '{}'", req.id))),
            Ok(false) => Ok(tool_error(Error::not_found("policy", req.id))),
            Err(e) => Ok(tool_error(e)),
        }
    }

    #[tool(description = "Copy a policy as a new Draft named \"<name> (Copy)\". Returns the copy.")]
    fn duplicate_policy(
        &self,
        Parameters(req): Parameters<IdRequest>,
    ) -> Result<CallToolResult, McpError> {
        match self.policies.duplicate(&req.id) {
            Ok(Some(copy)) => json_result(&copy),
            Ok(None) => Ok(tool_error(Error::not_found("policy", req.id))),
            Err(e) => Ok(tool_error(e)),
        }
    }

    // --- Generators ---

    #[tool(
        description = "Render an expert assignment template to policy text plus structured config. Each branch lists variableValues per selected variable, an action (preferred-expert or previous-expert), lookbackDays and enabledAttributes. Fails with every missing value listed."
    )]
    fn render_assignment_policy(
        &self,
        Parameters(req): Parameters<RenderAssignmentRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.render(&req.template, req.save_as.as_deref())
    }

    #[tool(
        description = "Render a ring expansion template: initial user groups (ug1..ug8, see get_catalog), then expansion rules with wait times in seconds. Set restricted to never fall back to the whole queue."
    )]
    fn render_ring_expansion(
        &self,
        Parameters(req): Parameters<RenderRingRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.render(&req.template, req.save_as.as_deref())
    }

    #[tool(
        description = "Render chat-style condition rows (variable, values, action, lookbackDays) into a \"When ..., <action>.\" policy."
    )]
    fn render_copilot_policy(
        &self,
        Parameters(req): Parameters<RenderCopilotRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.render(&req.policy, req.save_as.as_deref())
    }

    #[tool(
        description = "Pick the assignment scenario template that best matches a request (preferred expert, previous expert or tiered). Defaults to preferred expert when nothing matches."
    )]
    fn detect_scenario(
        &self,
        Parameters(req): Parameters<DetectScenarioRequest>,
    ) -> Result<CallToolResult, McpError> {
        json_result(detect_scenario(&req.message))
    }

    #[tool(
        description = "Everything the templates and forms can reference: context and live work item variables, user attributes, ring user groups, lookback and wait options, scenarios, engagement profiles, queue-profile mappings, trigger events and the criteria vocabulary."
    )]
    fn get_catalog(&self) -> Result<CallToolResult, McpError> {
        let vocabulary: Vec<serde_json::Value> = routebook_core::AttributeKey::ALL
            .iter()
            .map(|k| json!({ "attribute": k, "label": k.label(), "values": k.values() }))
            .collect();
        json_result(&json!({
            "contextVariables": catalog::CONTEXT_VARIABLES,
            "liveWorkItemVariables": catalog::LWI_VARIABLES,
            "userAttributes": catalog::USER_ATTRIBUTES,
            "ringUserGroups": catalog::RING_GROUPS,
            "lookbackDays": catalog::LOOKBACK_DAYS,
            "waitTimeSeconds": catalog::WAIT_TIME_SECONDS,
            "scenarios": copilot::SCENARIOS,
            "engagementProfiles": fixtures::engagement_profiles(),
            "queueProfileMappings": fixtures::queue_profile_mappings(),
            "triggerEvents": fixtures::trigger_events(),
            "criteriaVocabulary": vocabulary,
            "exampleCriteria": fixtures::EXAMPLE_CRITERIA,
        }))
    }
}

impl RoutebookServer {
    fn group_detail(&self, group: &UserGroup) -> serde_json::Value {
        let eligible: Vec<UserSummary> = group
            .eligible_users(&self.users)
            .into_iter()
            .map(UserSummary::from)
            .collect();
        json!({
            "group": group,
            "queues": group.associated_queues(&self.queues),
            "clauses": parse_criteria(&group.eligibility_criteria).clauses,
            "eligibleUsers": eligible,
        })
    }

    fn render(
        &self,
        template: &impl PolicyTemplate,
        save_as: Option<&str>,
    ) -> Result<CallToolResult, McpError> {
        let rendered = match template.apply() {
            Ok(r) => r,
            Err(issues) => return Ok(validation_error(&issues)),
        };
        let Some(name) = save_as else {
            return json_result(&rendered);
        };
        let config = rendered.config.clone();
        let id = new_policy_id();
        match self
            .policies
            .save(&id, rendered.into_draft(name, PolicyType::Assignment))
        {
            Ok(saved) => json_result(&json!({ "policy": saved, "config": config })),
            Err(e) => Ok(tool_error(e)),
        }
    }
}

#[tool_handler]
impl ServerHandler for RoutebookServer {
    fn get_info(&self) -> ServerInfo {
        let instructions = format!(
            "{}\n\n## Eligibility Criteria\n{}",
            INSTRUCTIONS,
            routebook_core::rules::CRITERIA_RULES
        );
        ServerInfo {
            instructions: Some(instructions.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

const INSTRUCTIONS: &str = "Routebook manages conversation distribution for a contact center: \
user groups of eligible agents (defined by free-text criteria), and routing policies \
(assignment, ring expansion, overflow) attached to engagement profiles. Policies are stored \
as readable behavior text; the render_* tools build that text from structured templates.";

// --- Helpers ---

fn text_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

fn tool_error(e: impl std::fmt::Display) -> CallToolResult {
    tracing::warn!(error = %e, "tool call failed");
    CallToolResult::error(vec![Content::text(e.to_string())])
}

fn validation_error(issues: &[ValidationIssue]) -> CallToolResult {
    let lines: Vec<String> = issues.iter().map(|i| format!("- {}", i)).collect();
    CallToolResult::error(vec![Content::text(format!(
        "Template is incomplete:\n{}",
        lines.join("\n")
    ))])
}

fn json_result<T: Serialize + ?Sized>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(text_result(json))
}

fn new_policy_id() -> String {
    format!("policy-{}", Utc::now().timestamp_millis())
}

/// Engagement profiles by id, each with the queues mapped to it.
fn resolve_profiles(ids: &[String]) -> Result<Vec<ProfileWithQueues>, String> {
    let profiles = fixtures::engagement_profiles();
    let mappings = fixtures::queue_profile_mappings();
    ids.iter()
        .map(|id| {
            let profile = profiles
                .iter()
                .find(|p| &p.id == id)
                .ok_or_else(|| format!("Unknown engagement profile '{}'", id))?;
            Ok(ProfileWithQueues {
                profile_id: profile.id.clone(),
                profile_name: profile.name.clone(),
                queues: mappings
                    .iter()
                    .filter(|m| m.profile_id == profile.id)
                    .map(|m| m.queue_name.clone())
                    .collect(),
            })
        })
        .collect()
}
