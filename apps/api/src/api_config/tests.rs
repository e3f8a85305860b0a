use std::collections::HashMap;

use tessera_domain::Provider;

use super::load_oauth_clients;

fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}

#[test]
fn complete_provider_blocks_are_loaded() {
    let env = env_of(&[
        ("TESSERA_OAUTH_SLACK_CLIENT_ID", "slack-client"),
        ("TESSERA_OAUTH_SLACK_CLIENT_SECRET", "slack-secret"),
        ("TESSERA_OAUTH_SLACK_REDIRECT_URI", "https://app.example.com/slack"),
        ("TESSERA_OAUTH_TRELLO_CLIENT_ID", "trello-key"),
        ("TESSERA_OAUTH_TRELLO_REDIRECT_URI", "https://app.example.com/trello"),
    ]);

    let clients = load_oauth_clients(|name| env.get(name).cloned());

    assert_eq!(clients.len(), 2);
    let slack = clients
        .get(&Provider::Slack)
        .unwrap_or_else(|| panic!("slack client missing"));
    assert_eq!(slack.client_id, "slack-client");
    assert_eq!(slack.client_secret.as_deref(), Some("slack-secret"));
    let trello = clients
        .get(&Provider::Trello)
        .unwrap_or_else(|| panic!("trello client missing"));
    assert_eq!(trello.client_secret, None);
}

#[test]
fn incomplete_or_blank_blocks_are_skipped() {
    let env = env_of(&[
        ("TESSERA_OAUTH_JIRA_CLIENT_ID", "jira-client"),
        ("TESSERA_OAUTH_TEAMS_CLIENT_ID", "  "),
        ("TESSERA_OAUTH_TEAMS_REDIRECT_URI", "https://app.example.com/teams"),
    ]);

    let clients = load_oauth_clients(|name| env.get(name).cloned());

    assert!(clients.is_empty());
}
