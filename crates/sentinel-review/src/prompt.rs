use sentinel_core::{ChatMessage, Language};

const REVIEW_SYSTEM_PT: &str = "Você é um code reviewer experiente.";
const REVIEW_SYSTEM_EN: &str = "You are an experienced code reviewer.";

const REVIEW_INSTRUCTIONS_PT: &str = "\
Você é um revisor sênior de código.
Analise apenas o diff abaixo, sem considerar contexto externo ou fazer suposições.

**Instruções:**
- Liste somente problemas reais, bugs ou riscos visíveis no diff.
- Para cada problema, indique uma das classificações de risco: **baixa**, **média** ou **alta**.
- Se não houver problemas críticos, responda: \"Nenhum problema crítico identificado.\"
- Ao final, forneça uma **classificação geral do risco do PR**: baixa, média ou alta, justifique em 1 frase.
- Seja sucinto e claro. Não repita sugestões.
- NÃO faça recomendações genéricas ou baseadas em hipóteses.
- Responda em português.

# Diff a ser analisado:
";

const REVIEW_INSTRUCTIONS_EN: &str = "\
You are a senior code reviewer.
Analyze only the diff below, without assuming any outside context.

**Instructions:**
- List only real problems, bugs or risks visible in the diff.
- For each problem, give one risk rating: **low**, **medium** or **high**.
- If there are no significant problems, answer: \"No significant problem identified.\"
- At the end, give an **overall PR risk rating**: low, medium or high, justified in one sentence.
- Be brief and clear. Do not repeat suggestions.
- Do NOT make generic or hypothetical recommendations.
- Answer in English.

# Diff to analyze:
";

const EXPLAIN_SYSTEM_PT: &str = "Você é um engenheiro de software experiente.";
const EXPLAIN_SYSTEM_EN: &str = "You are an experienced software engineer.";

/// Conversation asking for a risk-rated review of `diff`.
///
/// The diff must already be bounded and sanitized.
///
/// # Examples
///
/// ```
/// use sentinel_core::{Language, Role};
/// use sentinel_review::prompt::review_messages;
///
/// let messages = review_messages("+fn main() {}", Language::English);
/// assert_eq!(messages.len(), 2);
/// assert_eq!(messages[0].role, Role::System);
/// assert!(messages[1].content.ends_with("+fn main() {}\n"));
/// ```
pub fn review_messages(diff: &str, language: Language) -> Vec<ChatMessage> {
    let (system, instructions) = match language {
        Language::Portuguese => (REVIEW_SYSTEM_PT, REVIEW_INSTRUCTIONS_PT),
        Language::English => (REVIEW_SYSTEM_EN, REVIEW_INSTRUCTIONS_EN),
    };
    vec![
        ChatMessage::system(system),
        ChatMessage::user(format!("{instructions}{diff}\n")),
    ]
}

/// What the explain prompt is built from.
#[derive(Debug, Clone, Copy)]
pub struct ExplainInput<'a> {
    /// Pull request title.
    pub title: &'a str,
    /// Pull request body as written by the author.
    pub body: &'a str,
    /// Repository PR template, empty when absent.
    pub template: &'a str,
    /// Bounded, sanitized diff.
    pub diff: &'a str,
}

/// Conversation asking for a plain-language explanation of a pull request,
/// organized after the repository's PR template.
///
/// # Examples
///
/// ```
/// use sentinel_core::Language;
/// use sentinel_review::prompt::{explain_messages, ExplainInput};
///
/// let input = ExplainInput { title: "Add cache", body: "Speeds up reads", template: "", diff: "+cache" };
/// let messages = explain_messages(&input, Language::English);
/// assert!(messages[1].content.contains("Title: Add cache"));
/// assert!(messages[1].content.contains("--- PR TEMPLATE ---"));
/// ```
pub fn explain_messages(input: &ExplainInput<'_>, language: Language) -> Vec<ChatMessage> {
    let ExplainInput {
        title,
        body,
        template,
        diff,
    } = input;
    let (system, user) = match language {
        Language::Portuguese => (
            EXPLAIN_SYSTEM_PT,
            format!(
                "Você é um engenheiro de software experiente.
Explique de forma clara e didática o que muda neste Pull Request.
Considere:
- O título e descrição
- O diff das alterações
- O template de Pull Request que usamos no projeto

Siga o modelo do template do PR para organizar sua resposta.

Título: {title}
Descrição: {body}

--- TEMPLATE DO PR ---
{template}
--- FIM DO TEMPLATE ---

Diff:
{diff}
"
            ),
        ),
        Language::English => (
            EXPLAIN_SYSTEM_EN,
            format!(
                "You are an experienced software engineer.
Explain clearly and didactically what changes in this Pull Request.
Consider:
- The title and description
- The diff of the changes
- The Pull Request template used by the project

Follow the structure of the PR template to organize your answer.

Title: {title}
Description: {body}

--- PR TEMPLATE ---
{template}
--- END OF TEMPLATE ---

Diff:
{diff}
"
            ),
        ),
    };
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Comment body carrying the model's explanation.
pub fn explanation_comment(summary: &str, language: Language) -> String {
    match language {
        Language::Portuguese => format!(
            "\u{1f4dd} **Explicação automática deste PR (baseada no template):**\n\n{summary}"
        ),
        Language::English => format!(
            "\u{1f4dd} **Automatic explanation of this PR (based on the template):**\n\n{summary}"
        ),
    }
}

/// Body written into a pull request whose description was empty or only the
/// unfilled template.
pub fn fill_in_body(language: Language) -> &'static str {
    match language {
        Language::Portuguese => "\
### Preencha seu Pull Request corretamente!

- **Objetivo:** _Explique o objetivo deste PR_
- **Principais Mudanças:** _Liste as alterações realizadas_
- **Contexto/Observações:** _Informe qualquer ponto importante ou contexto adicional_

_Edite e salve seu PR para liberar o resumo automático por IA!_",
        Language::English => "\
### Please fill in your Pull Request!

- **Goal:** _Explain the goal of this PR_
- **Main changes:** _List the changes made_
- **Context/Notes:** _Add anything important or extra context_

_Edit and save your PR to unlock the automatic AI summary!_",
    }
}

/// Comment posted alongside [`fill_in_body`].
pub fn fill_in_comment(language: Language) -> &'static str {
    match language {
        Language::Portuguese => "\
\u{26a0}\u{fe0f} O corpo do PR estava vazio ou só com o template padrão.
Foi sugerido um modelo de preenchimento acima.
_Complete e salve o PR para liberar explicação automática por IA!_",
        Language::English => "\
\u{26a0}\u{fe0f} The PR body was empty or only contained the default template.
A fill-in outline was suggested above.
_Complete and save the PR to unlock the automatic AI explanation!_",
    }
}
