//! Embedded scaffolding content for `prompttest init`.

pub const PROMPT_CUSTOMER_SERVICE: &str = r#"---[SYSTEM]---
You are a support agent for Acme Internet.
Be empathetic and concise. Never promise refunds or credits you cannot grant.

---[USER]---
A customer on the {plan} plan writes:

{message}
"#;

pub const GLOBAL_CONFIG_YML: &str = r#"# Shared configuration for every suite in this directory tree.
# Suites can override any of these values in their own `config` block.
config:
  prompt: customer_service
  generation_model: "google/gemma-3-27b-it:free"
  evaluation_model: "google/gemma-3-27b-it:free"
  temperature: 0.0
"#;

pub const MAIN_SUITE_YML: &str = r#"tests:
  - id: frustrated-premium-customer
    inputs:
      plan: premium
      message: "My connection has dropped three times today. I work from home!"
    criteria: >
      The response must acknowledge the customer's frustration, apologize,
      and offer a concrete next step. It must not promise a refund.

  - id: simple-billing-question
    inputs:
      plan: basic
      message: "Where can I see my invoice?"
    criteria: The response must point the customer to their account's billing page.
"#;

pub const GUIDE_MD: &str = r#"# prompttest quick-start

Prompts live in `prompts/*.txt`. A prompt file is split into role sections
with `---[SYSTEM]---` / `---[USER]---` markers and may contain `{placeholder}`
tokens.

Test suites live in `prompttests/*.yml`. Each suite picks a prompt, supplies
`inputs` for its placeholders, and states pass/fail `criteria` in plain
English. A second model call grades each response against the criteria.

Shared settings go in `prompttests/prompttest.yml`; deeper directories can
add their own `prompttest.yml` to override, and each suite's `config` block
overrides both.

Run everything with `prompttest`, a single suite with `prompttest run main`,
or a single test with `prompttest run frustrated-*`.

Reports land in `.prompttest_reports/<timestamp>/` (see `latest/`), and model
replies are cached in `.prompttest_cache/` so unchanged tests are free to
re-run. Use `--no-cache` to force fresh calls.
"#;

pub const ENV_TEMPLATE: &str = r#"# Get your API key at https://openrouter.ai/keys
OPENROUTER_API_KEY=your_key_here
"#;
