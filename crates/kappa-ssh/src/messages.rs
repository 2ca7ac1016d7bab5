//! Login banner and the message bank shown beneath it.

use crate::writer::ColorCodes;
use rand::Rng;

/// Banner printed when a shell session starts.
pub const ASCII: &[&str] = &[
    r"  _  __                         ",
    r" | |/ /__ _ _ __  _ __   __ _   ",
    r" | ' // _` | '_ \| '_ \ / _` |  ",
    r" | . \ (_| | |_) | |_) | (_| |  ",
    r" |_|\_\__,_| .__/| .__/ \__,_|  ",
    r"           |_|   |_|            ",
];

/// A quote with an attributed author.
pub struct Quote {
    pub color: fn(&ColorCodes) -> &'static [u8],
    pub author: &'static str,
    pub text: &'static str,
}

impl Quote {
    fn write(&self, out: &mut Vec<u8>, colors: &ColorCodes) {
        out.extend_from_slice((self.color)(colors));
        out.extend_from_slice(b" ");
        out.extend_from_slice(self.author.as_bytes());
        out.extend_from_slice(colors.reset);
        out.extend_from_slice(b": ");
        out.extend_from_slice(self.text.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
}

/// One entry in the login message bank.
pub enum Message {
    Simple(&'static str),
    Quote(Quote),
    Conversation(&'static [Quote]),
}

impl Message {
    pub fn write(&self, out: &mut Vec<u8>, colors: &ColorCodes) {
        match self {
            Message::Simple(text) => {
                out.extend_from_slice(b" ");
                out.extend_from_slice(text.as_bytes());
                out.extend_from_slice(b"\r\n");
            }
            Message::Quote(quote) => quote.write(out, colors),
            Message::Conversation(quotes) => {
                for quote in *quotes {
                    quote.write(out, colors);
                }
                out.extend_from_slice(b"\r\n");
            }
        }
    }
}

static MESSAGES: &[Message] = &[
    Message::Simple("Welcome to Kappa DB, Yo!"),
    Message::Quote(Quote {
        color: |c| c.magenta,
        author: "Jessy Pinkman",
        text: "Yeah, Bitch! Magnets!",
    }),
    Message::Quote(Quote {
        color: |c| c.magenta,
        author: "Jessy Pinkman",
        text: "Yeah, Science!",
    }),
    Message::Quote(Quote {
        color: |c| c.blue,
        author: "Saul Goodman",
        text: "Better call Saul.",
    }),
    Message::Conversation(&[
        Quote {
            color: |c| c.green,
            author: "Walter White",
            text: "One particular element comes to mind...",
        },
        Quote {
            color: |c| c.magenta,
            author: "Jessy Pinkman",
            text: "Ohhhhh... wire..",
        },
    ]),
];

/// Writes one message drawn uniformly at random from the bank.
pub fn login_message(out: &mut Vec<u8>, colors: &ColorCodes) {
    let index = rand::thread_rng().gen_range(0..MESSAGES.len());
    MESSAGES[index].write(out, colors);
}
