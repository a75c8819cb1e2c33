use geoweather_core::{Content, Screen, ViewState};

/// Prints the view state as plain text: a status line on stderr while
/// loading, then either the details on stdout or the error on stderr.
#[derive(Debug)]
pub struct TerminalScreen {
    print_result: bool,
    announced_loading: bool,
}

impl TerminalScreen {
    pub fn new(print_result: bool) -> Self {
        Self { print_result, announced_loading: false }
    }
}

impl Screen for TerminalScreen {
    fn render(&mut self, view: &ViewState) {
        if view.loading {
            if !self.announced_loading {
                eprintln!("{}", view.trigger_label());
                self.announced_loading = true;
            }
            return;
        }

        self.announced_loading = false;
        if !self.print_result {
            return;
        }

        for line in lines(view) {
            match view.content {
                Content::Error(_) => eprintln!("{line}"),
                _ => println!("{line}"),
            }
        }
    }
}

fn lines(view: &ViewState) -> Vec<String> {
    let mut out = Vec::new();

    match &view.content {
        Content::Details(d) => {
            out.extend(view.location_line.clone());
            out.push(d.city_line.clone());
            out.push(format!("{}  {}", d.temperature, d.description));
            out.push(d.feels_like.clone());
            out.push(d.humidity.clone());
            out.push(d.wind.clone());
        }
        Content::Error(msg) => out.push(msg.clone()),
        Content::Empty => {}
    }

    out
}
