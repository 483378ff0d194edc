use serde_json::{Value, json};

use crate::llm::provider::FunctionDeclaration;

pub const GREETING_TEXT: &str = "Welcome to Maverick's IntelliTune Garage!\n\
• I am your AI service assistant.\n\
• How can I help with your vehicle today?\n\
• Type 'help' for available services or 'exit' to quit.";

pub const CONTACT_TEXT: &str = "📍 Maverick's IntelliTune Garage, Hesaraghatta Main Road, Bengaluru\n\
🕙 10 AM – 6 PM (Weekdays)\n\
📞 +91 98765 00000\n\
🌐 www.intellitune.com\n\
✉️ intellitune@tuning.com\n\
Please contact us for appointments or further information.";

/// The closed set of intents the agent can invoke. The model selects one via
/// function calling; there is no free-form tool registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Greet,
    EngineProblems { query: String },
    ScheduleService { query: String },
    AssessDamage { query: String },
    RoutineService { query: String },
    ContactInfo,
}

/// How a capability produces its reply: a fixed text, or exactly one
/// follow-up model call with a purpose-built prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityAction {
    Static(&'static str),
    FollowUp(String),
}

impl Capability {
    pub fn from_call(name: &str, args: &Value) -> Result<Self, String> {
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        match name {
            "greet_tool" => Ok(Self::Greet),
            "search_engine_problems" => Ok(Self::EngineProblems { query }),
            "schedule_service" => Ok(Self::ScheduleService { query }),
            "assess_damage" => Ok(Self::AssessDamage { query }),
            "routine_service" => Ok(Self::RoutineService { query }),
            "contact_info" => Ok(Self::ContactInfo),
            _ => Err(format!("unknown capability: {name}")),
        }
    }

    pub fn action(&self) -> CapabilityAction {
        match self {
            Self::Greet => CapabilityAction::Static(GREETING_TEXT),
            Self::ContactInfo => CapabilityAction::Static(CONTACT_TEXT),
            Self::EngineProblems { query } => CapabilityAction::FollowUp(follow_up_prompt(
                "Engine Complaint Analyzer",
                "User says",
                query,
                "respond with 3-5 concise bullet points on possible causes or checks",
            )),
            Self::ScheduleService { query } => CapabilityAction::FollowUp(follow_up_prompt(
                "Scheduled Service Scheduler",
                "User query",
                query,
                "respond with 3-5 concise bullet points on recommended maintenance",
            )),
            Self::AssessDamage { query } => CapabilityAction::FollowUp(follow_up_prompt(
                "Accident Damage Assessor",
                "User says",
                query,
                "respond with 3-5 concise bullet points assessing potential damage or advice",
            )),
            Self::RoutineService { query } => CapabilityAction::FollowUp(follow_up_prompt(
                "Routine Service Coordinator",
                "User asks",
                query,
                "respond with 3-5 concise bullet points on routine checks",
            )),
        }
    }
}

fn follow_up_prompt(headline: &str, lead: &str, query: &str, instruction: &str) -> String {
    format!(
        "You are Maverick's IntelliTune Garage AI.\n\
         {headline}\n\
         {lead}: \"{query}\"\n\
         \n\
         - If you need one concise follow-up question to better understand the request, ask it.\n\
         - Otherwise, {instruction}.\n\
         - End with: \"Please contact us to get this fixed or for more info.\""
    )
}

pub fn declarations() -> Vec<FunctionDeclaration> {
    let no_args = json!({
        "type": "object",
        "properties": {}
    });
    let query_arg = |description: &str| {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": description,
                }
            },
            "required": ["query"]
        })
    };

    vec![
        FunctionDeclaration {
            name: "greet_tool".to_string(),
            description: "Use when the user offers a greeting, says hello, or when initiating \
                          the conversation. Responds with a standardized welcome message."
                .to_string(),
            parameters_json_schema: no_args.clone(),
        },
        FunctionDeclaration {
            name: "search_engine_problems".to_string(),
            description: "Use to analyze engine-related complaints, such as 'car won't start', \
                          'engine is making a strange noise' or 'check engine light is on'."
                .to_string(),
            parameters_json_schema: query_arg("The user's description of the engine problem"),
        },
        FunctionDeclaration {
            name: "schedule_service".to_string(),
            description: "Use when the user wants to schedule a service or asks about \
                          recommended maintenance intervals, such as 'I need to book an oil \
                          change' or 'What maintenance is needed at 50000 miles?'."
                .to_string(),
            parameters_json_schema: query_arg(
                "The user's request related to scheduling or maintenance",
            ),
        },
        FunctionDeclaration {
            name: "assess_damage".to_string(),
            description: "Use when the user describes accident damage to their vehicle, such as \
                          'I had a fender bender' or 'My bumper is cracked'."
                .to_string(),
            parameters_json_schema: query_arg(
                "The user's description of the accident or damage",
            ),
        },
        FunctionDeclaration {
            name: "routine_service".to_string(),
            description: "Use when the user asks about routine service checks or specific \
                          routine maintenance tasks, such as tire rotation or oil check \
                          intervals."
                .to_string(),
            parameters_json_schema: query_arg("The user's question about routine service"),
        },
        FunctionDeclaration {
            name: "contact_info".to_string(),
            description: "Use when the user asks for contact details, address, phone number, or \
                          opening hours of the garage. Returns static contact details."
                .to_string(),
            parameters_json_schema: no_args,
        },
    ]
}
