use async_trait::async_trait;
use colored::*;
use huddle_client::{CallError, MediaError, MediaSink, MeetingBehavior, RemoteStream};
use huddle_core::ParticipantId;

/// Prints meeting events to the terminal.
pub struct ConsoleBehavior;

#[async_trait]
impl MeetingBehavior for ConsoleBehavior {
    async fn on_joined(&self, local_id: &ParticipantId) {
        println!(
            "{} {}",
            "✅ Joined as".green().bold(),
            local_id.to_string().bold()
        );
    }

    async fn on_message(&self, text: &str) {
        println!("{} {}", "💬".cyan(), text);
    }

    async fn on_participant_count(&self, count: u32) {
        println!("{}", format!("👥 {count} participant(s) in the meeting").dimmed());
    }

    async fn on_media_unavailable(&self, error: &MediaError) {
        eprintln!("{} {}", "⚠️  Local media unavailable:".yellow(), error);
    }

    async fn on_call_failed(&self, peer_id: &ParticipantId, error: &CallError) {
        eprintln!(
            "{} {}: {}",
            "❌ Call failed with".red(),
            peer_id.to_string().bold(),
            error
        );
    }
}

#[async_trait]
impl MediaSink for ConsoleBehavior {
    async fn on_remote_stream(&self, peer_id: &ParticipantId, stream: RemoteStream) {
        let kind = match stream.kind() {
            Some(kind) => format!("{kind:?}").to_lowercase(),
            None => "unknown".to_owned(),
        };
        println!(
            "{} {} {} {}",
            "📡 Receiving".green(),
            kind,
            "from".green(),
            peer_id.to_string().bold()
        );
    }

    async fn on_stream_ended(&self, peer_id: &ParticipantId) {
        println!("{} {}", "📴 Media ended from".dimmed(), peer_id);
    }
}
