use std::sync::Arc;

use leptos::prelude::*;
use log::info;

use crate::components::flow_graph::{
	AgentDefinition, FlowGraphCanvas, GraphCallbacks, GraphProps, Mode, Resource, ResourceKind,
	ResourceUpdate, Suggestion, SuggestionGroup, SuggestionOp,
};

fn resource(kind: ResourceKind, id: &str, name: &str, description: &str) -> Resource {
	Resource {
		id: id.to_string(),
		kind,
		name: name.to_string(),
		description: description.to_string(),
		icon_url: None,
		project_type: None,
		slug: None,
		folder_path: None,
		available_tools: Vec::new(),
	}
}

/// Sample customer-support agent flow.
fn sample_flow(mode: Mode) -> GraphProps {
	let resources = vec![
		resource(
			ResourceKind::Tool,
			"tool-search",
			"search_docs",
			"Search the documentation index",
		),
		resource(
			ResourceKind::Tool,
			"tool-ticket",
			"create_ticket",
			"Open a ticket in the helpdesk",
		),
		resource(
			ResourceKind::Context,
			"ctx-kb",
			"knowledge_base",
			"Product knowledge base",
		),
		resource(
			ResourceKind::Escalation,
			"esc-human",
			"support_team",
			"Hand off to a human agent",
		),
		resource(
			ResourceKind::Mcp,
			"mcp-calendar",
			"calendar",
			"Scheduling over MCP",
		),
		resource(
			ResourceKind::MemorySpace,
			"mem-threads",
			"conversations",
			"Past conversation memory",
		),
	];
	let model = resource(ResourceKind::Model, "model-1", "gpt-4o", "");

	let suggestion_group = SuggestionGroup {
		id: "sg-demo".to_string(),
		suggestions: vec![
			Suggestion {
				id: "sug-summarize".to_string(),
				op: SuggestionOp::Add(resource(
					ResourceKind::Tool,
					"tool-summarize",
					"summarize_thread",
					"Summarize the active conversation",
				)),
				is_standalone: false,
			},
			Suggestion {
				id: "sug-rename".to_string(),
				op: SuggestionOp::Update(ResourceUpdate {
					resource_id: "tool-search".to_string(),
					name: Some("search_knowledge".to_string()),
					description: None,
				}),
				is_standalone: false,
			},
		],
	};

	let active_resource_ids = if mode == Mode::View {
		vec!["tool-search".to_string()]
	} else {
		Vec::new()
	};

	GraphProps {
		mode,
		name: "Support Agent".to_string(),
		description: "Answers questions, escalates when stuck".to_string(),
		definition: AgentDefinition {
			process_key: "support_agent".to_string(),
			name: "Support Agent".to_string(),
			description: String::new(),
			resources: resources.clone(),
			model: Some(model.clone()),
		},
		resources,
		model: Some(model),
		spans: Vec::new(),
		active_resource_ids,
		suggestion_group: (mode == Mode::Design).then_some(suggestion_group),
		parent_node_id: None,
		initial_selected_resource_id: None,
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let (mode, set_mode) = signal(Mode::Design);
	let flow = Signal::derive(move || sample_flow(mode.get()));

	let callbacks = GraphCallbacks {
		on_select_resource: Some(Arc::new(|id| info!("selected resource: {id:?}"))),
		on_add_resource: Some(Arc::new(|kind| info!("add resource of kind {kind:?}"))),
		on_remove_resource: Some(Arc::new(|r| info!("remove resource {}", r.id))),
		on_act_on_suggestion: Some(Arc::new(|id, action| {
			info!("suggestion {id}: {action:?}");
		})),
		..Default::default()
	};

	let toggle_mode = move |_| {
		set_mode.update(|m| {
			*m = match m {
				Mode::Design => Mode::View,
				Mode::View => Mode::Design,
			}
		});
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<FlowGraphCanvas data=flow callbacks=callbacks fullscreen=true />
				<div class="graph-overlay">
					<h1>"Agent Flow"</h1>
					<p class="subtitle">
						"Drag resources to reorder. Scroll to zoom. Drag background to pan."
					</p>
					<button class="mode-toggle" on:click=toggle_mode>
						{move || {
							match mode.get() {
								Mode::Design => "Switch to view mode",
								Mode::View => "Switch to design mode",
							}
						}}
					</button>
				</div>
			</div>
		</ErrorBoundary>
	}
}
