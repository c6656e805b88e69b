/// How eligibility criteria are read. Shared by the MCP instructions and tool descriptions.
pub const CRITERIA_RULES: &str = "\
1. Criteria are free text. Only known attribute values count; every other word is ignored.\n\
2. Attributes: Skills, Language, Region, Capacity profile, Intent, Presence. Call `get_catalog` \
for the full list of values each attribute accepts.\n\
3. Clauses are separated by `,` `;` `.` `:` `!` `?`, line breaks, or the words \"and\" / \"but\". \
Naming an attribute (\"Skills\", \"language\", \"region\", \"presence\") scopes the values around it \
in that clause, e.g. \"Skills Billing, Spanish language\". After \"and\", values keep the attribute \
(and any negation) of the list they continue: \"Intent Returns and Sales\" is one intent list.\n\
4. Several values of one attribute are alternatives: \"Spanish or English language\" admits a user \
who speaks either.\n\
5. Different attributes must all hold: \"Skills Billing, Region Europe\" admits only billing agents \
in Europe. A user with no value for a constrained attribute is not eligible.\n\
6. \"not\", \"except\", \"excluding\", \"without\" or \"no\" turns the values after it in the same \
clause into exclusions: \"Skills Billing, not Spanish\".\n\
7. Text that names no known value applies no filter and every user is eligible. Use \
`preview_eligible_users` to check the parse before saving a group.\n\
\n\
## Workflow\n\
1. `list_user_groups` and `list_queues` to see what exists.\n\
2. Draft criteria and call `preview_eligible_users` until the eligible set is what you intend.\n\
3. `save_user_group` with the criteria and the queue ids it serves.\n\
4. For routing policies, `render_assignment_policy` or `render_ring_expansion` to produce the \
behavior text, then `save_policy` with that text. Policies are saved as Draft unless told otherwise.";
