use anyhow::Result;
use chrono::{DateTime, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph, Tabs},
    Frame,
};
use std::{io, time::Duration};
use textwrap::wrap;
use tui_input::{backend::crossterm::EventHandler, Input};

use rolodex::{AuthMode, Decision, Session};

// Export types needed by main module
pub use ratatui::backend::CrosstermBackend;
pub use ratatui::Terminal;

/// What the user asked for. The main loop owns the session and performs
/// the actual network exchange for each action.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    Quit,
    Authenticate {
        mode: AuthMode,
        email: String,
        password: String,
        name: String,
    },
    Logout,
    RefreshContacts,
    RefreshRequests,
    Search(String),
    SendRequest(String),
    Respond {
        request_id: i64,
        decision: Decision,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tab {
    Contacts,
    Requests,
    Search,
    Profile,
}

impl Tab {
    fn next(self) -> Tab {
        match self {
            Tab::Contacts => Tab::Requests,
            Tab::Requests => Tab::Search,
            Tab::Search => Tab::Profile,
            Tab::Profile => Tab::Contacts,
        }
    }

    fn index(self) -> usize {
        match self {
            Tab::Contacts => 0,
            Tab::Requests => 1,
            Tab::Search => 2,
            Tab::Profile => 3,
        }
    }
}

enum Screen {
    Login,
    Main,
}

#[derive(Clone, Copy, PartialEq)]
enum LoginField {
    Name,
    Email,
    Password,
}

struct Toast {
    text: String,
    is_error: bool,
    created: DateTime<Utc>,
}

pub struct AppUI {
    screen: Screen,
    // Login screen state
    auth_mode: AuthMode,
    name_input: Input,
    email_input: Input,
    password_input: Input,
    login_focus: LoginField,
    // Main screen state
    active_tab: Tab,
    contact_index: usize,
    request_index: usize,
    result_index: usize,
    search_input: Input,
    toast: Option<Toast>,
}

impl AppUI {
    pub fn new() -> Self {
        AppUI {
            screen: Screen::Login,
            auth_mode: AuthMode::Login,
            name_input: Input::default(),
            email_input: Input::default(),
            password_input: Input::default(),
            login_focus: LoginField::Email,
            active_tab: Tab::Contacts,
            contact_index: 0,
            request_index: 0,
            result_index: 0,
            search_input: Input::default(),
            toast: None,
        }
    }

    /// Pre-populate the login form, e.g. from cached credentials.
    pub fn prefill_credentials(&mut self, email: &str, password: &str) {
        self.email_input = Input::new(email.to_string());
        self.password_input = Input::new(password.to_string());
    }

    /// Enter the main tabbed screen after a successful authenticate.
    pub fn show_main(&mut self) {
        self.screen = Screen::Main;
        self.active_tab = Tab::Contacts;
        self.contact_index = 0;
        self.request_index = 0;
        self.result_index = 0;
        self.search_input = Input::default();
    }

    /// Back to the login screen after logout. The email stays prefilled,
    /// everything secret or session-derived is cleared.
    pub fn show_login(&mut self) {
        self.screen = Screen::Login;
        self.password_input = Input::default();
        self.name_input = Input::default();
        self.login_focus = LoginField::Email;
        self.search_input = Input::default();
    }

    pub fn clear_search_input(&mut self) {
        self.search_input = Input::default();
        self.result_index = 0;
    }

    pub fn show_toast(&mut self, text: &str) {
        self.toast = Some(Toast {
            text: text.to_string(),
            is_error: false,
            created: Utc::now(),
        });
    }

    pub fn show_error(&mut self, text: &str) {
        self.toast = Some(Toast {
            text: text.to_string(),
            is_error: true,
            created: Utc::now(),
        });
    }

    /// Drop the toast once it has been on screen long enough.
    pub fn clean_toast(&mut self, max_age_secs: i64) {
        if let Some(toast) = &self.toast {
            if (Utc::now() - toast.created).num_seconds() >= max_age_secs {
                self.toast = None;
            }
        }
    }

    pub fn handle_input(&mut self, session: &Session) -> Result<Option<UiAction>> {
        if !event::poll(Duration::from_millis(50))? {
            return Ok(None);
        }
        let Event::Key(key) = event::read()? else {
            return Ok(None);
        };
        if key.kind != KeyEventKind::Press {
            return Ok(None);
        }

        match self.screen {
            Screen::Login => self.handle_login_key(key),
            Screen::Main => self.handle_main_key(key, session),
        }
    }

    fn handle_login_key(&mut self, key: event::KeyEvent) -> Result<Option<UiAction>> {
        match key.code {
            KeyCode::Esc => return Ok(Some(UiAction::Quit)),
            KeyCode::Enter => {
                return Ok(Some(UiAction::Authenticate {
                    mode: self.auth_mode,
                    email: self.email_input.value().trim().to_string(),
                    password: self.password_input.value().to_string(),
                    name: self.name_input.value().trim().to_string(),
                }));
            }
            KeyCode::Tab | KeyCode::Down => {
                self.login_focus = self.next_login_field(self.login_focus);
                return Ok(None);
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.login_focus = self.prev_login_field(self.login_focus);
                return Ok(None);
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.auth_mode = match self.auth_mode {
                    AuthMode::Login => AuthMode::Register,
                    AuthMode::Register => AuthMode::Login,
                };
                if self.auth_mode == AuthMode::Login && self.login_focus == LoginField::Name {
                    self.login_focus = LoginField::Email;
                }
                return Ok(None);
            }
            _ => {}
        }

        let focused = match self.login_focus {
            LoginField::Name => &mut self.name_input,
            LoginField::Email => &mut self.email_input,
            LoginField::Password => &mut self.password_input,
        };
        focused.handle_event(&Event::Key(key));
        Ok(None)
    }

    fn next_login_field(&self, field: LoginField) -> LoginField {
        match (field, self.auth_mode) {
            (LoginField::Email, AuthMode::Login) => LoginField::Password,
            (LoginField::Password, AuthMode::Login) => LoginField::Email,
            (LoginField::Name, _) => LoginField::Email,
            (LoginField::Email, AuthMode::Register) => LoginField::Password,
            (LoginField::Password, AuthMode::Register) => LoginField::Name,
        }
    }

    fn prev_login_field(&self, field: LoginField) -> LoginField {
        match (field, self.auth_mode) {
            (LoginField::Email, AuthMode::Login) => LoginField::Password,
            (LoginField::Password, AuthMode::Login) => LoginField::Email,
            (LoginField::Name, _) => LoginField::Password,
            (LoginField::Email, AuthMode::Register) => LoginField::Name,
            (LoginField::Password, AuthMode::Register) => LoginField::Email,
        }
    }

    fn handle_main_key(
        &mut self,
        key: event::KeyEvent,
        session: &Session,
    ) -> Result<Option<UiAction>> {
        match key.code {
            KeyCode::Esc => return Ok(Some(UiAction::Quit)),
            KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(Some(UiAction::Logout));
            }
            KeyCode::Tab => {
                self.active_tab = self.active_tab.next();
                // Entering Contacts or Requests always re-fetches; no
                // caching across tab switches.
                return Ok(match self.active_tab {
                    Tab::Contacts => {
                        self.contact_index = 0;
                        Some(UiAction::RefreshContacts)
                    }
                    Tab::Requests => {
                        self.request_index = 0;
                        Some(UiAction::RefreshRequests)
                    }
                    _ => None,
                });
            }
            _ => {}
        }

        match self.active_tab {
            Tab::Contacts => {
                match key.code {
                    KeyCode::Down => {
                        let len = session.contacts().len();
                        if len > 0 {
                            self.contact_index = (self.contact_index + 1) % len;
                        }
                    }
                    KeyCode::Up => {
                        let len = session.contacts().len();
                        if len > 0 {
                            self.contact_index = (self.contact_index + len - 1) % len;
                        }
                    }
                    _ => {}
                }
                Ok(None)
            }
            Tab::Requests => {
                let len = session.requests().len();
                match key.code {
                    KeyCode::Down if len > 0 => {
                        self.request_index = (self.request_index + 1) % len;
                    }
                    KeyCode::Up if len > 0 => {
                        self.request_index = (self.request_index + len - 1) % len;
                    }
                    KeyCode::Char('a') | KeyCode::Char('y') if len > 0 => {
                        let request = &session.requests()[self.request_index.min(len - 1)];
                        return Ok(Some(UiAction::Respond {
                            request_id: request.request_id,
                            decision: Decision::Accept,
                        }));
                    }
                    KeyCode::Char('r') | KeyCode::Char('n') if len > 0 => {
                        let request = &session.requests()[self.request_index.min(len - 1)];
                        return Ok(Some(UiAction::Respond {
                            request_id: request.request_id,
                            decision: Decision::Reject,
                        }));
                    }
                    _ => {}
                }
                Ok(None)
            }
            Tab::Search => {
                let results = session.search_results();
                match key.code {
                    KeyCode::Enter => {
                        return Ok(Some(UiAction::Search(
                            self.search_input.value().to_string(),
                        )));
                    }
                    KeyCode::Down if !results.is_empty() => {
                        self.result_index = (self.result_index + 1) % results.len();
                    }
                    KeyCode::Up if !results.is_empty() => {
                        self.result_index = (self.result_index + results.len() - 1) % results.len();
                    }
                    KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        if !results.is_empty() {
                            let user = &results[self.result_index.min(results.len() - 1)];
                            return Ok(Some(UiAction::SendRequest(user.email.clone())));
                        }
                    }
                    _ => {
                        self.search_input.handle_event(&Event::Key(key));
                    }
                }
                Ok(None)
            }
            Tab::Profile => Ok(None),
        }
    }

    pub fn draw<B: Backend>(&self, frame: &mut Frame<B>, session: &Session) {
        match self.screen {
            Screen::Login => self.draw_login(frame),
            Screen::Main => self.draw_main(frame, session),
        }
    }

    fn draw_login<B: Backend>(&self, frame: &mut Frame<B>) {
        let size = frame.size();
        let card = centered_rect(50, 60, size);

        let title = match self.auth_mode {
            AuthMode::Login => "rolodex — sign in",
            AuthMode::Register => "rolodex — create account",
        };
        frame.render_widget(
            Block::default().title(title).borders(Borders::ALL),
            card,
        );

        let inner = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // name (register only)
                Constraint::Length(3), // email
                Constraint::Length(3), // password
                Constraint::Length(1), // spacer
                Constraint::Length(2), // help
            ])
            .split(card);

        if self.auth_mode == AuthMode::Register {
            self.draw_field(frame, inner[0], "Name", &self.name_input, false,
                self.login_focus == LoginField::Name);
        }
        self.draw_field(frame, inner[1], "Email", &self.email_input, false,
            self.login_focus == LoginField::Email);
        self.draw_field(frame, inner[2], "Password", &self.password_input, true,
            self.login_focus == LoginField::Password);

        let help = Paragraph::new(Line::from(Span::styled(
            "Enter submit | Tab next field | Ctrl+R switch login/register | Esc quit",
            Style::default().fg(Color::Gray),
        )));
        frame.render_widget(help, inner[4]);

        if let Some(toast) = &self.toast {
            draw_toast(frame, toast, size);
        }
    }

    fn draw_field<B: Backend>(
        &self,
        frame: &mut Frame<B>,
        area: Rect,
        label: &str,
        input: &Input,
        mask: bool,
        focused: bool,
    ) {
        let shown = if mask {
            "*".repeat(input.value().chars().count())
        } else {
            input.value().to_string()
        };
        let block = Block::default().title(label).borders(Borders::ALL).border_style(
            if focused {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            },
        );
        frame.render_widget(Paragraph::new(shown).block(block), area);
        if focused {
            frame.set_cursor(area.x + input.cursor() as u16 + 1, area.y + 1);
        }
    }

    fn draw_main<B: Backend>(&self, frame: &mut Frame<B>, session: &Session) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // tab bar
                Constraint::Min(5),    // tab content
                Constraint::Length(2), // toast
                Constraint::Length(1), // help line
            ])
            .split(size);

        let titles: Vec<Line> = ["Contacts", "Requests", "Search", "Profile"]
            .iter()
            .map(|t| Line::from(*t))
            .collect();
        let tabs = Tabs::new(titles)
            .select(self.active_tab.index())
            .block(Block::default().borders(Borders::ALL).title(
                session.user().map(|u| u.name.clone()).unwrap_or_default(),
            ))
            .highlight_style(Style::default().fg(Color::Yellow));
        frame.render_widget(tabs, chunks[0]);

        match self.active_tab {
            Tab::Contacts => self.draw_contacts(frame, chunks[1], session),
            Tab::Requests => self.draw_requests(frame, chunks[1], session),
            Tab::Search => self.draw_search(frame, chunks[1], session),
            Tab::Profile => self.draw_profile(frame, chunks[1], session),
        }

        if let Some(toast) = &self.toast {
            let style = if toast.is_error {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Green)
            };
            let text = wrap(&toast.text, chunks[2].width.max(1) as usize)
                .into_iter()
                .map(|line| Line::from(line.into_owned()))
                .collect::<Vec<_>>();
            frame.render_widget(Paragraph::new(text).style(style), chunks[2]);
        }

        let help = match self.active_tab {
            Tab::Requests => "Tab switch tab | Up/Down select | a accept | r reject | Ctrl+L logout | Esc quit",
            Tab::Search => "Tab switch tab | type + Enter search | Up/Down select | Ctrl+A send request | Ctrl+L logout | Esc quit",
            _ => "Tab switch tab | Up/Down select | Ctrl+L logout | Esc quit",
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(help, Style::default().fg(Color::Gray)))),
            chunks[3],
        );
    }

    fn draw_contacts<B: Backend>(&self, frame: &mut Frame<B>, area: Rect, session: &Session) {
        let contacts = session.contacts();
        if contacts.is_empty() {
            let empty = Paragraph::new("No contacts yet.\nFind people in the Search tab.")
                .block(Block::default().title("My contacts").borders(Borders::ALL));
            frame.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = contacts
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let added = c
                    .added_at
                    .as_deref()
                    .map(|t| format!("  (added {})", t))
                    .unwrap_or_default();
                let content = if i == self.contact_index {
                    format!("> {} <{}>{}", c.name, c.email, added)
                } else {
                    format!("  {} <{}>{}", c.name, c.email, added)
                };
                ListItem::new(content)
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .title(format!("My contacts ({})", contacts.len()))
                .borders(Borders::ALL),
        );
        frame.render_widget(list, area);
    }

    fn draw_requests<B: Backend>(&self, frame: &mut Frame<B>, area: Rect, session: &Session) {
        let halves = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        let requests = session.requests();
        if requests.is_empty() {
            frame.render_widget(
                Paragraph::new("No new requests.")
                    .block(Block::default().title("Incoming requests").borders(Borders::ALL)),
                halves[0],
            );
        } else {
            let items: Vec<ListItem> = requests
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    let content = if i == self.request_index {
                        format!("> {} <{}>", r.name, r.email)
                    } else {
                        format!("  {} <{}>", r.name, r.email)
                    };
                    ListItem::new(content)
                })
                .collect();
            frame.render_widget(
                List::new(items).block(
                    Block::default()
                        .title(format!("Incoming requests ({})", requests.len()))
                        .borders(Borders::ALL),
                ),
                halves[0],
            );
        }

        let sent = session.sent_requests();
        let sent_items: Vec<ListItem> = sent
            .iter()
            .map(|r| ListItem::new(format!("  {} <{}>  pending", r.name, r.email)))
            .collect();
        let sent_block = Block::default()
            .title(format!("Sent ({})", sent.len()))
            .borders(Borders::ALL);
        if sent.is_empty() {
            frame.render_widget(
                Paragraph::new("No outgoing requests.").block(sent_block),
                halves[1],
            );
        } else {
            frame.render_widget(List::new(sent_items).block(sent_block), halves[1]);
        }
    }

    fn draw_search<B: Backend>(&self, frame: &mut Frame<B>, area: Rect, session: &Session) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);

        let input_block = Block::default()
            .title("Search by name or email")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow));
        frame.render_widget(
            Paragraph::new(self.search_input.value()).block(input_block),
            chunks[0],
        );
        frame.set_cursor(
            chunks[0].x + self.search_input.cursor() as u16 + 1,
            chunks[0].y + 1,
        );

        let results = session.search_results();
        let results_block = Block::default()
            .title(format!("Results ({})", results.len()))
            .borders(Borders::ALL);
        if results.is_empty() {
            frame.render_widget(
                Paragraph::new("Type a query and press Enter.").block(results_block),
                chunks[1],
            );
            return;
        }
        let items: Vec<ListItem> = results
            .iter()
            .enumerate()
            .map(|(i, u)| {
                let content = if i == self.result_index {
                    format!("> {} <{}>  [Ctrl+A to add]", u.name, u.email)
                } else {
                    format!("  {} <{}>", u.name, u.email)
                };
                ListItem::new(content)
            })
            .collect();
        frame.render_widget(List::new(items).block(results_block), chunks[1]);
    }

    fn draw_profile<B: Backend>(&self, frame: &mut Frame<B>, area: Rect, session: &Session) {
        let mut lines = Vec::new();
        if let Some(user) = session.user() {
            lines.push(Line::from(Span::styled(
                user.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(user.email.clone()));
            if let Some(avatar) = &user.avatar_url {
                lines.push(Line::from(format!("Avatar: {}", avatar)));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(format!(
                "Total contacts: {}",
                session.contacts().len()
            )));
        }
        frame.render_widget(
            Paragraph::new(lines).block(Block::default().title("Profile").borders(Borders::ALL)),
            area,
        );
    }
}

fn draw_toast<B: Backend>(frame: &mut Frame<B>, toast: &Toast, size: Rect) {
    let area = Rect {
        x: size.x,
        y: size.bottom().saturating_sub(2),
        width: size.width,
        height: 2,
    };
    let style = if toast.is_error {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    };
    let text = wrap(&toast.text, area.width.max(1) as usize)
        .into_iter()
        .map(|line| Line::from(line.into_owned()))
        .collect::<Vec<_>>();
    frame.render_widget(Paragraph::new(text).style(style), area);
}

/// Rect centered in `r`, sized as percentages of it.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

pub fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
