use crate::llm::Message;

pub fn blog_prompt(topic: &str) -> String {
    format!("Write a markdown blog about: {}", topic)
}

/// Messages for a single blog post request: an optional system message
/// followed by the user instruction.
pub fn messages(topic: &str, system: Option<&str>) -> Vec<Message> {
    system
        .map(|s| Message::System(s.to_string()))
        .into_iter()
        .chain(std::iter::once(Message::User(blog_prompt(topic))))
        .collect()
}
