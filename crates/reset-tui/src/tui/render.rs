use rand::Rng;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use timeline::{gate, GateState, Tier};

use super::{App, Focus, InputMode, BREACH_MESSAGE, HIDDEN_MESSAGE};

pub(crate) fn app(frame: &mut Frame, app: &mut App) {
    let area = frame.size();
    let [title, countdown, message, play, announce, portal, prompt, footer] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(4),
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(5),
        Constraint::Length(2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_title(frame, title);
    render_countdown(frame, countdown, app);
    render_hidden_message(frame, message, app);
    render_play_control(frame, play, app);
    render_announcement(frame, announce, app);
    if app.gate.state() != GateState::Hidden {
        render_portal(frame, portal, app);
    }
    if app.mode == InputMode::Override {
        render_override_prompt(frame, prompt, app);
    }
    render_footer(frame, footer, app);

    overlay_glitch(frame, area, app);
}

fn render_title(frame: &mut Frame, layout: Rect) {
    let title = Paragraph::new("T I M E L I N E   R E S E T")
        .alignment(Alignment::Center)
        .style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(title, layout);
}

fn render_countdown(frame: &mut Frame, layout: Rect, app: &App) {
    let style = Style::default().fg(tier_color(app.fx.tier()).unwrap_or(Color::White));
    let mut lines = vec![
        Line::styled(app.parts.to_string(), style.add_modifier(Modifier::BOLD)),
        Line::raw("days  hours  mins  secs"),
        Line::styled(format!("interference: {}", app.fx.tier()), style),
    ];
    if app.breached {
        lines.push(Line::styled(
            BREACH_MESSAGE,
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD | Modifier::RAPID_BLINK),
        ));
    }
    frame.render_widget(
        Paragraph::new(Text::from(lines)).alignment(Alignment::Center),
        layout,
    );
}

fn render_hidden_message(frame: &mut Frame, layout: Rect, app: &App) {
    if !app.player.message_revealed() {
        return;
    }
    let message = Paragraph::new(HIDDEN_MESSAGE)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Cyan));
    frame.render_widget(message, layout);
}

fn render_play_control(frame: &mut Frame, layout: Rect, app: &App) {
    let label = if app.player.is_playing() {
        "[ ·· RECEIVING ·· ]"
    } else if app.player.has_played() {
        "[ TRANSMISSION RECEIVED ]"
    } else {
        "[ > PLAY TRANSMISSION < ]"
    };

    let mut style = Style::default();
    if app.player.has_played() {
        style = style.fg(Color::DarkGray);
    }
    if app.focus == Focus::Play {
        style = style.add_modifier(Modifier::REVERSED);
    }

    frame.render_widget(
        Paragraph::new(Line::styled(label, style)).alignment(Alignment::Center),
        layout,
    );
}

fn render_announcement(frame: &mut Frame, layout: Rect, app: &App) {
    let Some(announcement) = &app.announcement else {
        return;
    };
    frame.render_widget(
        Paragraph::new(announcement.as_str())
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow)),
        layout,
    );
}

fn render_portal(frame: &mut Frame, layout: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("THE PORTAL")
        .title_alignment(Alignment::Center);
    let inner = block.inner(layout);
    frame.render_widget(block, layout);

    let unlocked = app.gate.state() == GateState::Unlocked;
    let input_style = if unlocked {
        Style::default().fg(Color::DarkGray)
    } else if app.focus == Focus::Gate {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let cursor = if unlocked || app.focus != Focus::Gate {
        ""
    } else {
        "█"
    };

    let message = if unlocked {
        Line::styled(gate::SUCCESS_MESSAGE, Style::default().fg(Color::Green))
    } else if let Some(phrase) = app.gate.rejection() {
        Line::styled(
            format!("{phrase} {}", gate::REJECTION_SUFFIX),
            Style::default().fg(Color::Red),
        )
    } else {
        Line::raw("speak and the gate will answer")
    };

    let lines = vec![
        Line::from(vec![
            Span::raw("entry vector: "),
            Span::styled(format!("{}{cursor}", app.gate_input), input_style),
        ]),
        message,
    ];
    frame.render_widget(Paragraph::new(Text::from(lines)), inner);
}

fn render_override_prompt(frame: &mut Frame, layout: Rect, app: &App) {
    let error = app
        .override_error
        .as_deref()
        .unwrap_or("empty input clears the override");
    let lines = vec![
        Line::from(vec![
            Span::raw("mock instant: "),
            Span::styled(
                format!("{}█", app.override_buf),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::styled(error, Style::default().fg(Color::Yellow)),
    ];
    frame.render_widget(Paragraph::new(Text::from(lines)), layout);
}

fn render_footer(frame: &mut Frame, layout: Rect, app: &App) {
    let text = match app.mode {
        InputMode::Override => "ENTER: set mock instant, ESC: cancel",
        InputMode::Normal => match app.focus {
            Focus::Play if app.gate.state() == GateState::Visible => {
                "ENTER/SPACE: play, TAB: portal, `: mock clock, q: quit"
            }
            Focus::Play => "ENTER/SPACE: play transmission, `: mock clock, q: quit",
            Focus::Gate => "type and ENTER to submit, TAB: back",
        },
    };
    frame.render_widget(Text::raw(text), layout);
}

const GLYPHS: [char; 10] = ['▒', '░', '▓', '█', '▚', '▞', '╳', '#', '%', '&'];

/// Scatters glitch glyphs over the finished frame. Density and color
/// follow the current level so the corruption creeps up as the countdown
/// runs out.
fn overlay_glitch(frame: &mut Frame, area: Rect, app: &App) {
    let Some(color) = tier_color(app.fx.tier()) else {
        return;
    };
    let density = app.fx.level() * 0.12;
    let mut rng = rand::rng();

    let buf = frame.buffer_mut();
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            if rng.random::<f64>() < density {
                buf.get_mut(x, y)
                    .set_char(GLYPHS[rng.random_range(0..GLYPHS.len())])
                    .set_fg(color);
            }
        }
    }
}

fn tier_color(tier: Tier) -> Option<Color> {
    match tier {
        Tier::Off => None,
        Tier::Low => Some(Color::DarkGray),
        Tier::Medium => Some(Color::Magenta),
        Tier::High => Some(Color::LightRed),
        Tier::Extreme => Some(Color::Red),
    }
}
