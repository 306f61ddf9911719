//! Thought / Action / Observation loop over a [`ToolRegistry`].

use super::tools::ToolRegistry;
use crate::llm::{ChatMessage, CompletionOptions, NarrativeClient};
use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

const STOPPED_MESSAGE: &str = "Agent stopped due to iteration limit.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentStep {
    pub tool: String,
    pub input: String,
    pub observation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentOutcome {
    pub output: String,
    pub steps: Vec<AgentStep>,
}

/// What the model asked for in one turn.
#[derive(Debug, PartialEq)]
enum Decision {
    Final(String),
    Action { tool: String, input: String },
    Invalid(&'static str),
}

fn field<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    text.lines()
        .filter_map(|l| l.trim().strip_prefix(key))
        .map(str::trim)
        .next()
}

fn parse_reply(reply: &str) -> Decision {
    if let Some(idx) = reply.find("Final Answer:") {
        return Decision::Final(reply[idx + "Final Answer:".len()..].trim().to_string());
    }
    let Some(tool) = field(reply, "Action:") else {
        return Decision::Invalid("Invalid Format: Missing 'Action:' after 'Thought:'");
    };
    let Some(input) = field(reply, "Action Input:") else {
        return Decision::Invalid("Invalid Format: Missing 'Action Input:' after 'Action:'");
    };
    Decision::Action {
        tool: tool.trim_matches('`').to_string(),
        input: input.to_string(),
    }
}

pub struct ReactAgent {
    client: Arc<dyn NarrativeClient>,
    tools: ToolRegistry,
    max_iterations: usize,
    temperature: f32,
}

impl ReactAgent {
    pub fn new(
        client: Arc<dyn NarrativeClient>,
        tools: ToolRegistry,
        max_iterations: usize,
        temperature: f32,
    ) -> Self {
        Self {
            client,
            tools,
            max_iterations: max_iterations.max(1),
            temperature,
        }
    }

    fn system_prompt(&self) -> String {
        format!(
            "Answer the following question as best you can. You have access to the following tools:

{tools}

Use the following format:

Thought: think about what to do next
Action: the tool to use, exactly one of [{names}]
Action Input: the input to the tool
Observation: the result of the tool
... (Thought/Action/Action Input/Observation can repeat)
Thought: I now know the final answer
Final Answer: the final answer to the original question

Write only one Action per reply and stop after 'Action Input'.",
            tools = self.tools.describe(),
            names = self.tools.names().join(", "),
        )
    }

    pub async fn run(&self, query: &str, ticker: &str) -> Result<AgentOutcome> {
        let mut messages = vec![
            ChatMessage::system(self.system_prompt()),
            ChatMessage::user(format!("{} The company ticker is {}.", query.trim(), ticker)),
        ];
        let options = CompletionOptions {
            temperature: Some(self.temperature),
            stop: Some(vec!["\nObservation:".to_string()]),
        };
        let mut steps = Vec::new();
        if self.tools.is_empty() {
            warn!("Agent has no tools registered");
        }

        for iteration in 1..=self.max_iterations {
            let reply = self
                .client
                .complete(&messages, &options)
                .await
                .with_context(|| format!("agent iteration {}", iteration))?;
            debug!("agent reply {}: {}", iteration, reply);

            let observation = match parse_reply(&reply) {
                Decision::Final(output) => {
                    info!("Agent finished after {} tool calls", steps.len());
                    return Ok(AgentOutcome { output, steps });
                }
                Decision::Invalid(msg) => {
                    warn!("Unparsable agent output ({}), asking again", msg);
                    msg.to_string()
                }
                Decision::Action { tool, input } => {
                    let observation = self.invoke(&tool, &input).await;
                    steps.push(AgentStep {
                        tool,
                        input,
                        observation: observation.clone(),
                    });
                    observation
                }
            };

            messages.push(ChatMessage::assistant(reply));
            messages.push(ChatMessage::user(format!("Observation: {}", observation)));
        }

        warn!("Agent hit the iteration limit ({})", self.max_iterations);
        Ok(AgentOutcome {
            output: STOPPED_MESSAGE.to_string(),
            steps,
        })
    }

    /// Tool failures become observations so the model can recover.
    async fn invoke(&self, tool: &str, input: &str) -> String {
        let Some(t) = self.tools.get(tool) else {
            return format!(
                "{} is not a valid tool, try one of [{}].",
                tool,
                self.tools.names().join(", ")
            );
        };
        info!("🛠️ {}({})", t.name(), input);
        match t.call(input).await {
            Ok(out) => out,
            Err(e) => {
                warn!("{} failed: {:#}", t.name(), e);
                format!("Tool error: {:#}", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::AgentTool;
    use crate::error::LlmError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays scripted replies in order.
    struct Script {
        replies: Mutex<Vec<&'static str>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl Script {
        fn new(mut replies: Vec<&'static str>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl NarrativeClient for Script {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            options: &CompletionOptions,
        ) -> Result<String, LlmError> {
            assert_eq!(options.stop.as_deref(), Some(&["\nObservation:".to_string()][..]));
            self.seen.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .map(str::to_string)
                .ok_or_else(|| LlmError::UnexpectedResponse("script exhausted".into()))
        }

        fn model(&self) -> &str {
            "script"
        }
    }

    struct Health;

    #[async_trait]
    impl AgentTool for Health {
        fn name(&self) -> &str {
            "Fundamental Analysis"
        }
        fn description(&self) -> &str {
            "Financial health."
        }
        async fn call(&self, input: &str) -> Result<String> {
            if input == "BROKEN" {
                anyhow::bail!("no data");
            }
            Ok(format!("{input} looks healthy"))
        }
    }

    fn agent(script: Arc<Script>, max_iterations: usize) -> ReactAgent {
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(Health));
        ReactAgent::new(script, tools, max_iterations, 0.9)
    }

    #[test]
    fn parses_decisions() {
        assert_eq!(
            parse_reply("Thought: check\nAction: Fundamental Analysis\nAction Input: ITC"),
            Decision::Action {
                tool: "Fundamental Analysis".into(),
                input: "ITC".into()
            }
        );
        assert_eq!(
            parse_reply("Thought: done\nFinal Answer: Healthy.\nMore detail."),
            Decision::Final("Healthy.\nMore detail.".into())
        );
        assert!(matches!(parse_reply("I think ITC is fine"), Decision::Invalid(_)));
        assert!(matches!(parse_reply("Action: Forensic Audit"), Decision::Invalid(_)));
    }

    #[tokio::test]
    async fn runs_tool_then_answers() {
        let script = Arc::new(Script::new(vec![
            "Thought: look at fundamentals\nAction: Fundamental Analysis\nAction Input: ITC",
            "Thought: I now know the final answer\nFinal Answer: ITC is healthy.",
        ]));
        let outcome = agent(script.clone(), 5).run("Check health.", "ITC").await.unwrap();

        assert_eq!(outcome.output, "ITC is healthy.");
        assert_eq!(
            outcome.steps,
            vec![AgentStep {
                tool: "Fundamental Analysis".into(),
                input: "ITC".into(),
                observation: "ITC looks healthy".into(),
            }]
        );

        let seen = script.seen.lock().unwrap();
        assert!(seen[0][0].content.contains("Fundamental Analysis: Financial health."));
        assert_eq!(seen[0][1].content, "Check health. The company ticker is ITC.");
        assert_eq!(seen[1].last().unwrap().content, "Observation: ITC looks healthy");
    }

    #[tokio::test]
    async fn recovers_from_bad_format_and_unknown_tool() {
        let script = Arc::new(Script::new(vec![
            "ITC seems fine",
            "Action: Stock Price\nAction Input: ITC",
            "Action: Fundamental Analysis\nAction Input: BROKEN",
            "Final Answer: unclear",
        ]));
        let outcome = agent(script.clone(), 5).run("Q", "ITC").await.unwrap();

        assert_eq!(outcome.output, "unclear");
        assert_eq!(outcome.steps.len(), 2);
        assert!(outcome.steps[0].observation.contains("not a valid tool"));
        assert_eq!(outcome.steps[1].observation, "Tool error: no data");

        let seen = script.seen.lock().unwrap();
        assert!(seen[1].last().unwrap().content.contains("Invalid Format"));
    }

    #[tokio::test]
    async fn stops_at_iteration_limit() {
        let script = Arc::new(Script::new(vec![
            "Action: Fundamental Analysis\nAction Input: ITC",
            "Action: Fundamental Analysis\nAction Input: ITC",
        ]));
        let outcome = agent(script, 2).run("Q", "ITC").await.unwrap();
        assert_eq!(outcome.output, STOPPED_MESSAGE);
        assert_eq!(outcome.steps.len(), 2);
    }
}
