//! The terminal browser: layout, rendering, and the event loop
//!
//! Backend work never runs on this thread. Jobs returned by the controller
//! are spawned on workers and their outputs come back over a channel that
//! the loop drains every tick.

use super::error::{Result, UiError};
use super::events::{Action, handle_key, prompt_for_tool};
use super::state::{AppState, FocusPane, Mode};
use super::theme::Theme;
use super::widgets::{
    FileTable, HelpBar, HelpOverlay, Inspector, InspectorView, LogPanel, NavTree, StatusBar,
    TagList, TextInputModal, hints_for,
};
use crate::browse::{
    Engine, Event, Job, JobOutput, NavigationNode, NoticeLevel, PaneController, PaneState,
};
use crate::config::TagpaneConfig;
use crate::gateway::{Tool, ToolRegistry};
use crate::logging::LogBuffer;
use crossterm::event::{self, Event as TermEvent};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders};
use ratatui::{Frame, Terminal};
use std::io::{self, IsTerminal, Stdout};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;
use tracing::{debug, info, warn};

const TICK: Duration = Duration::from_millis(50);

pub struct Browser<'a> {
    engine: &'a Engine,
    config: &'a mut TagpaneConfig,
    registry: &'a ToolRegistry,
    logs: &'a LogBuffer,
    controller: PaneController,
    state: AppState,
    theme: Theme,
    tx: Sender<JobOutput>,
    rx: Receiver<JobOutput>,
}

impl<'a> Browser<'a> {
    #[must_use]
    pub fn new(
        engine: &'a Engine,
        config: &'a mut TagpaneConfig,
        registry: &'a ToolRegistry,
        cwd: &Path,
        logs: &'a LogBuffer,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        let state = AppState::new(config, cwd);
        Self {
            engine,
            config,
            registry,
            logs,
            controller: PaneController::new(cwd),
            state,
            theme: Theme::default(),
            tx,
            rx,
        }
    }

    /// Open `start` and run until the user quits
    ///
    /// # Errors
    ///
    /// Returns `UiError` if stdout is not a terminal or terminal I/O fails.
    pub fn run(mut self, start: NavigationNode) -> Result<()> {
        if !io::stdout().is_terminal() {
            return Err(UiError::NotATerminal("stdout"));
        }

        info!(node = %start, "browser starting");
        self.dispatch(Event::NavigationChanged(start));

        let mut terminal = setup_terminal()?;
        let result = self.run_loop(&mut terminal);
        cleanup_terminal()?;
        info!("browser closed");
        result
    }

    fn run_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        while !self.state.should_quit {
            self.drain_outputs();
            self.sync_view();

            terminal.draw(|frame| {
                render(frame, &mut self.state, &self.controller, &self.theme, self.logs);
            })?;

            if event::poll(TICK)?
                && let TermEvent::Key(key) = event::read()?
            {
                let action = handle_key(&mut self.state, &self.controller, key);
                self.perform(action);
            }
        }
        Ok(())
    }

    fn perform(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Quit => self.state.should_quit = true,
            Action::Dispatch(event) => self.dispatch(event),
            Action::ConfigureTool(tool, path) => self.configure_tool(tool, &path),
        }
    }

    fn dispatch(&mut self, event: Event) {
        match self.controller.handle(event) {
            Ok(jobs) => self.spawn(jobs),
            Err(e) => self.state.push_message(NoticeLevel::Error, e.to_string()),
        }
    }

    fn spawn(&self, jobs: Vec<Job>) {
        for job in jobs {
            debug!(kind = %job.ticket.kind, "spawning job");
            self.engine.spawn(job, self.tx.clone());
        }
    }

    fn drain_outputs(&mut self) {
        while let Ok(output) = self.rx.try_recv() {
            let jobs = self.controller.apply(output);
            self.spawn(jobs);
        }
        for notice in self.controller.take_notices() {
            self.state.messages.push(notice.into());
        }
        self.state.expire_messages();

        if self.state.mode != Mode::Input
            && let Some(tool) = self.controller.take_tool_prompt()
        {
            prompt_for_tool(&mut self.state, tool);
        }
    }

    /// Keep view cursors in range and the controller's selection in step
    /// with the file under the cursor
    fn sync_view(&mut self) {
        self.state.tags.clamp(self.controller.tags().len());
        if *self.controller.files_pane() != PaneState::Ready {
            return;
        }
        let records = self.controller.records();
        self.state.files.sync(records);
        let wanted = self.state.files.selected_paths(records);
        if wanted != self.controller.selection().files {
            self.dispatch(Event::FileSelectionChanged(wanted));
        }
    }

    fn configure_tool(&mut self, tool: Tool, path: &Path) {
        if let Err(e) = self.registry.set(tool, path) {
            self.state.push_message(NoticeLevel::Error, e.to_string());
            return;
        }
        self.config.set_tool_path(tool, path);
        match self.config.save() {
            Ok(()) => self
                .state
                .push_message(NoticeLevel::Info, format!("{tool} set to {}", path.display())),
            Err(e) => {
                warn!(error = %e, "failed to save tool path");
                self.state.push_message(
                    NoticeLevel::Warning,
                    format!("{tool} set for this session only: {e}"),
                );
            }
        }
        self.dispatch(Event::ToolConfigured(tool));
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

fn cleanup_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

fn pane_block<'b>(title: String, focused: bool, theme: &Theme) -> Block<'b> {
    let (border_style, title_style) = if focused {
        (theme.focused_border_style(), theme.focused_title_style())
    } else {
        (theme.border_style(), theme.unfocused_title_style())
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(title, title_style))
}

fn render(
    frame: &mut Frame,
    state: &mut AppState,
    controller: &PaneController,
    theme: &Theme,
    logs: &LogBuffer,
) {
    let [content, status, help] = Layout::vertical([
        Constraint::Min(5),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_panes(frame, state, controller, theme, content);

    let status_bar = StatusBar::new(state.current_message(), theme)
        .busy(controller.is_busy())
        .location(controller.node().map(NavigationNode::label))
        .counts(controller.records().len(), controller.selection().files.len());
    frame.render_widget(status_bar, status);

    let hints = hints_for(state.mode, state.focus);
    frame.render_widget(HelpBar::new(&hints, theme), help);

    match state.mode {
        Mode::Help => frame.render_widget(HelpOverlay::new(theme), frame.area()),
        Mode::Log => {
            let lines = logs.snapshot();
            frame.render_widget(LogPanel::new(&lines, state.log_scroll, theme), frame.area());
        }
        Mode::Input => {
            if let Some(input) = &state.input {
                frame.render_widget(TextInputModal::new(input, theme), frame.area());
            }
        }
        Mode::Normal => {}
    }
}

fn render_panes(
    frame: &mut Frame,
    state: &mut AppState,
    controller: &PaneController,
    theme: &Theme,
    area: Rect,
) {
    let [left, middle, right] = Layout::horizontal([
        Constraint::Percentage(25),
        Constraint::Percentage(45),
        Constraint::Percentage(30),
    ])
    .areas(area);
    let [nav_area, tags_area] =
        Layout::vertical([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(left);

    let focus = state.focus;

    let nav = NavTree::new(theme)
        .block(pane_block(
            " Navigation ".into(),
            focus == FocusPane::Navigation,
            theme,
        ))
        .active(controller.node())
        .focused(focus == FocusPane::Navigation);
    frame.render_stateful_widget(nav, nav_area, &mut state.nav);

    let tags = TagList::new(controller.tags(), controller.tags_pane(), &mut state.tags, theme)
        .block(pane_block(
            format!(" Tags ({}) ", controller.tags().len()),
            focus == FocusPane::Tags,
            theme,
        ))
        .focused(focus == FocusPane::Tags);
    frame.render_widget(tags, tags_area);

    let files_title = controller
        .node()
        .map_or_else(|| " Files ".to_string(), |n| format!(" Files: {} ", n.label()));
    let files = FileTable::new(
        controller.records(),
        controller.files_pane(),
        &mut state.files,
        theme,
    )
    .block(pane_block(files_title, focus == FocusPane::Files, theme))
    .focused(focus == FocusPane::Files);
    frame.render_widget(files, middle);

    let selection = controller.selection();
    let inspector = Inspector::new(
        InspectorView {
            pane: controller.inspector_pane(),
            snapshot: controller.metadata(),
            record: selection.single().and_then(|p| controller.record(p)),
            selected: selection.files.len(),
            priority_keys: &state.priority_keys,
            max_value_width: state.max_value_width,
        },
        theme,
    )
    .block(pane_block(
        " Inspector ".into(),
        focus == FocusPane::Inspector,
        theme,
    ))
    .scroll(state.inspector_scroll);
    frame.render_widget(inspector, right);
}
