//! Dashboard orchestration: resolve, animate, transform.
//!
//! [`ResultPresenter`] produces a [`DashboardState`]; all later interaction
//! goes through [`DashboardState::apply`] so it can be driven without a
//! terminal attached.

use crate::assistant::{AssistantContext, CryptoAssistant};
use crate::client::AnalysisBackend;
use crate::pipeline::{PipelineObserver, PipelineSequencer};
use crate::resolver::{NavigationContext, ResultResolver, ResultSource};
use crate::storage::{load_envelope, StorageScope};
use crate::view::DashboardView;
use clap::ValueEnum;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Tab {
    /// Metrics, protocol summary and algorithm tables
    #[default]
    Overview,
    /// Protocol statistics, charts and cards
    Protocols,
    /// Control-flow-graph illustration
    ControlFlow,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Overview, Tab::Protocols, Tab::ControlFlow];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Protocols => "Protocols",
            Tab::ControlFlow => "Control Flow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Table,
    Graph,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Table => ViewMode::Graph,
            ViewMode::Graph => ViewMode::Table,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    SelectTab(Tab),
    ToggleView,
    Ask(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// State changed; the active tab should be drawn again.
    Redraw,
    /// Assistant answer to show in the chat pane.
    Reply(String),
    /// Nothing changed.
    Ignored,
}

#[derive(Debug)]
pub struct DashboardState {
    pub view: DashboardView,
    pub source: ResultSource,
    tab: Tab,
    view_mode: ViewMode,
    assistant: CryptoAssistant,
    context: AssistantContext,
}

impl DashboardState {
    pub fn new(view: DashboardView, source: ResultSource, context: AssistantContext) -> Self {
        Self {
            view,
            source,
            tab: Tab::default(),
            view_mode: ViewMode::default(),
            assistant: CryptoAssistant::new(),
            context,
        }
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn assistant(&self) -> &CryptoAssistant {
        &self.assistant
    }

    pub fn apply(&mut self, action: UiAction) -> ActionOutcome {
        match action {
            UiAction::SelectTab(tab) if tab == self.tab => ActionOutcome::Ignored,
            UiAction::SelectTab(tab) => {
                log::debug!("Switching to {} tab", tab.title());
                self.tab = tab;
                ActionOutcome::Redraw
            }
            UiAction::ToggleView => {
                self.view_mode = self.view_mode.toggled();
                ActionOutcome::Redraw
            }
            UiAction::Ask(message) => match self.assistant.ask(&message, &self.context) {
                Some(reply) => ActionOutcome::Reply(reply),
                None => ActionOutcome::Ignored,
            },
        }
    }
}

pub struct ResultPresenter<'a> {
    resolver: ResultResolver<'a>,
    session: &'a dyn StorageScope,
    sequencer: PipelineSequencer,
}

impl<'a> ResultPresenter<'a> {
    pub fn new(
        backend: &'a dyn AnalysisBackend,
        session: &'a dyn StorageScope,
        sequencer: PipelineSequencer,
    ) -> Self {
        Self {
            resolver: ResultResolver::new(backend, session),
            session,
            sequencer,
        }
    }

    /// Resolution completes before the animation starts and the view is only
    /// built once the animation has finished.
    pub async fn present<O, R>(
        &self,
        ctx: &NavigationContext,
        observer: &mut O,
        rng: &mut R,
    ) -> DashboardState
    where
        O: PipelineObserver + ?Sized,
        R: Rng + ?Sized,
    {
        let resolution = self.resolver.resolve(ctx).await;
        log::info!(
            "Showing {} ({} source)",
            resolution.record.filename,
            resolution.source
        );

        self.sequencer.run(observer).await;

        let view = DashboardView::build(&resolution.record, rng);
        let context = AssistantContext::from_envelope(load_envelope(self.session).as_ref());
        DashboardState::new(view, resolution.source, context)
    }
}
