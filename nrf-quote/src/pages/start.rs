//! Start page: explains the service and enters the wizard

use nrf_common::constants::routes;
use nrf_common::navigation::PageGraph;

use super::{FormPayload, PageContext, PageController, PageOutcome, PageResponse};
use crate::error::ApiResult;
use crate::views;

pub struct StartPage {
    graph: PageGraph,
}

impl StartPage {
    pub fn new(graph: PageGraph) -> Self {
        Self { graph }
    }
}

impl PageController for StartPage {
    fn route(&self) -> &'static str {
        routes::START
    }

    fn get(&self, ctx: &PageContext) -> ApiResult<PageResponse> {
        let body = format!(
            r#"<h1 class="govuk-heading-l">Get a quote for the Nature Restoration Fund levy</h1>
<p class="govuk-body">Use this service to get an estimate of the levy for your development.</p>
<p class="govuk-body">You will need:</p>
<ul class="govuk-list govuk-list--bullet">
    <li>the red line boundary of your development, if you have one</li>
    <li>the number of each type of building you plan to build</li>
    <li>how the development will deal with waste water</li>
</ul>
<form method="post" action="{action}" novalidate>
    {button}
</form>"#,
            action = views::escape(&ctx.form_action()),
            button = views::button("Start now"),
        );
        Ok(PageResponse::View(views::page("Get a quote", None, &[], &body)))
    }

    fn post(&self, _ctx: &PageContext, _payload: &FormPayload) -> ApiResult<PageOutcome> {
        let next = self.graph.next(routes::START)?;
        Ok(PageOutcome::respond(PageResponse::Redirect(next)))
    }
}
