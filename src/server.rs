//
// Purpose:
//
// `VectraToolsServer` is the MCP face of the crate. It implements `rmcp::ServerHandler`
// and carries the `#[tool(tool_box)]` attribute, which registers every investigation
// operation as a named tool that MCP clients can list and call.
//
// Structure:
// - Tool parameter structs (e.g. `ListAssignmentsParams`, `CreateAssignmentParams`):
//   `serde::Deserialize` for parsing call arguments, `schemars::JsonSchema` so clients
//   can discover how to call each tool.
// - Tool methods: thin wrappers that hand the arguments to `InvestigationTools` and
//   package the outcome into a `CallToolResult`. Failures are returned as error results
//   rather than JSON-RPC errors, so the agent sees the message.

use rmcp::{
    model::{
        CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    schemars, tool, Error as McpError, ServerHandler,
};
use std::sync::Arc;

use crate::tools::{InvestigationTools, ToolError};
use crate::vectra::client::InvestigationApi;

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ListAssignmentsParams {
    #[serde(default)]
    #[schemars(
        description = "Filter assignments by resolved state. True for resolved, False for unresolved. Default is False."
    )]
    pub resolved: bool,
    #[schemars(
        description = "Use this to list assignments created at or after this time stamp (YYYY-MM-DDTHH:MM:SS)"
    )]
    pub created_after: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ListAssignmentsForUserParams {
    #[schemars(description = "Vectra platform user ID to retrieve assignments for.")]
    pub user_id: i64,
    #[serde(default)]
    #[schemars(
        description = "Filter assignments by resolved state. True for resolved, False for unresolved. Default is False to retrieve only open assignments."
    )]
    pub resolved: bool,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct AssignmentIdParams {
    #[schemars(description = "ID of the assignment (must be 1 or greater)")]
    pub assignment_id: i64,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct AssignmentForEntityParams {
    #[schemars(description = "List of entity IDs to retrieve assignments for")]
    pub entity_ids: Vec<i64>,
    #[schemars(description = "Type of entity to retrieve assignments for: \"host\" or \"account\"")]
    pub entity_type: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct CreateAssignmentParams {
    #[schemars(description = "ID of the user to assign the entity to (must be 1 or greater)")]
    pub assign_to_user_id: i64,
    #[schemars(description = "ID of the entity (account or host) to assign.")]
    pub assign_entity_id: i64,
    #[schemars(
        description = "Type of the entity specified in assign_entity_id: \"account\" or \"host\""
    )]
    pub assign_entity_type: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct CreateEntityNoteParams {
    #[schemars(description = "ID of the entity to add the note to (must be 1 or greater)")]
    pub entity_id: i64,
    #[schemars(description = "Type of entity to add the note to: \"host\" or \"account\"")]
    pub entity_type: String,
    #[schemars(description = "Note text to add to the entity.")]
    pub note: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct MarkDetectionFixedParams {
    #[schemars(description = "List of detection IDs to mark as fixed or not fixed")]
    pub detection_ids: Vec<i64>,
    #[schemars(description = "True to mark as fixed, False to unmark as fixed")]
    pub mark_fixed: bool,
}

#[derive(Clone)]
pub struct VectraToolsServer {
    tools: InvestigationTools,
}

fn into_call_result(tool_name: &str, outcome: Result<String, ToolError>) -> CallToolResult {
    match outcome {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(e) => {
            tracing::error!(tool = tool_name, "{}", e);
            CallToolResult::error(vec![Content::text(e.to_string())])
        }
    }
}

#[tool(tool_box)]
impl VectraToolsServer {
    pub fn new(client: Arc<dyn InvestigationApi>) -> Self {
        Self {
            tools: InvestigationTools::new(client),
        }
    }

    #[tool(
        name = "list_assignments",
        description = "List investigation assignments, optionally filtered by resolved state and creation time. Returns JSON."
    )]
    async fn list_assignments(
        &self,
        #[tool(aggr)] params: ListAssignmentsParams,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .tools
            .list_assignments(params.resolved, params.created_after.as_deref())
            .await;
        Ok(into_call_result("list_assignments", outcome))
    }

    #[tool(
        name = "list_assignments_for_user",
        description = "List investigation assignments assigned to a user/analyst. Returns JSON."
    )]
    async fn list_assignments_for_user(
        &self,
        #[tool(aggr)] params: ListAssignmentsForUserParams,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .tools
            .list_assignments_for_user(params.user_id, params.resolved)
            .await;
        Ok(into_call_result("list_assignments_for_user", outcome))
    }

    #[tool(
        name = "get_assignment_detail_by_id",
        description = "Retrieve details of a specific investigation assignment. Returns JSON."
    )]
    async fn get_assignment_detail_by_id(
        &self,
        #[tool(aggr)] params: AssignmentIdParams,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .tools
            .get_assignment_detail_by_id(params.assignment_id)
            .await;
        Ok(into_call_result("get_assignment_detail_by_id", outcome))
    }

    #[tool(
        name = "get_assignment_for_entity",
        description = "Retrieve investigation assignments for one or more hosts or accounts. Returns JSON."
    )]
    async fn get_assignment_for_entity(
        &self,
        #[tool(aggr)] params: AssignmentForEntityParams,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .tools
            .get_assignment_for_entity(&params.entity_ids, &params.entity_type)
            .await;
        Ok(into_call_result("get_assignment_for_entity", outcome))
    }

    #[tool(
        name = "create_assignment",
        description = "Create an investigation assignment for an account or host. Returns the created assignment as JSON."
    )]
    async fn create_assignment(
        &self,
        #[tool(aggr)] params: CreateAssignmentParams,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .tools
            .create_assignment(
                params.assign_to_user_id,
                params.assign_entity_id,
                &params.assign_entity_type,
            )
            .await;
        Ok(into_call_result("create_assignment", outcome))
    }

    #[tool(
        name = "create_entity_note",
        description = "Add an investigation note to an entity (host or account). Returns the created note as JSON."
    )]
    async fn create_entity_note(
        &self,
        #[tool(aggr)] params: CreateEntityNoteParams,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .tools
            .create_entity_note(params.entity_id, &params.entity_type, &params.note)
            .await;
        Ok(into_call_result("create_entity_note", outcome))
    }

    #[tool(
        name = "mark_detection_fixed",
        description = "Mark or unmark detections as fixed. Marking as fixed closes a detection as remediated."
    )]
    async fn mark_detection_fixed(
        &self,
        #[tool(aggr)] params: MarkDetectionFixedParams,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .tools
            .mark_detection_fixed(&params.detection_ids, params.mark_fixed)
            .await;
        Ok(into_call_result("mark_detection_fixed", outcome))
    }

    #[tool(
        name = "delete_assignment",
        description = "Unassign or delete an investigation assignment by its ID. Use list_assignments and list_assignments_for_user to fetch assignment IDs."
    )]
    async fn delete_assignment(
        &self,
        #[tool(aggr)] params: AssignmentIdParams,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self.tools.delete_assignment(params.assignment_id).await;
        Ok(into_call_result("delete_assignment", outcome))
    }
}

#[tool(tool_box)]
impl ServerHandler for VectraToolsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "This server provides access to Vectra AI investigation workflows.\n\
                Available tools:\n\
                - 'list_assignments': Lists assignments. Optional 'resolved' (default false) and \
                'created_after' (YYYY-MM-DDTHH:MM:SS).\n\
                - 'list_assignments_for_user': Lists assignments for 'user_id'. Optional 'resolved'.\n\
                - 'get_assignment_detail_by_id': Retrieves one assignment by 'assignment_id'.\n\
                - 'get_assignment_for_entity': Retrieves assignments for 'entity_ids' of 'entity_type' \
                (host or account).\n\
                - 'create_assignment': Assigns a host or account to 'assign_to_user_id'.\n\
                - 'create_entity_note': Adds a 'note' to a host or account.\n\
                - 'mark_detection_fixed': Marks 'detection_ids' as fixed or not fixed.\n\
                - 'delete_assignment': Deletes an assignment by 'assignment_id'."
                    .to_string(),
            ),
        }
    }
}
