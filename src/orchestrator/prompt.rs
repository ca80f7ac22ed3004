//! Message framing sent to agents.

/// How the writer's delta is framed for the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// The writer asked for input, or the cycle was forced.
    Engaged,
    /// The writer is journaling without asking; the agent may stay silent.
    Passive,
}

const ENGAGED_PREFIX: &str =
    "[The writer is directly asking for your input. Respond to what they wrote.]";

const PASSIVE_PREFIX: &str = "[Passive observation: the writer is journaling and has not asked \
for input. Reply with exactly [listening] unless you have something genuinely useful to add.]";

const TRANSCRIPT_HEADER: &str = "[Other companions have already replied in this round:]";

impl Framing {
    pub fn prefix(&self) -> &'static str {
        match self {
            Framing::Engaged => ENGAGED_PREFIX,
            Framing::Passive => PASSIVE_PREFIX,
        }
    }
}

/// Prefix the delta with the framing instruction.
pub fn frame_delta(delta: &str, framing: Framing) -> String {
    format!("{}\n\n{}", framing.prefix(), delta)
}

/// Append the running transcript of earlier replies, one `[Name]: reply`
/// entry per reply. An empty transcript leaves the message unchanged.
pub fn with_transcript(message: &str, transcript: &[(String, String)]) -> String {
    if transcript.is_empty() {
        return message.to_string();
    }
    let mut out = String::with_capacity(message.len() + 64);
    out.push_str(message);
    out.push_str("\n\n");
    out.push_str(TRANSCRIPT_HEADER);
    for (name, reply) in transcript {
        out.push('\n');
        out.push_str(&format!("[{}]: {}", name, reply));
    }
    out
}
